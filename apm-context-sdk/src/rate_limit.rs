use std::time::SystemTime;

// leaky bucket based rate limit, refilled by elapsed wall time
pub(crate) struct LeakyBucket {
    per_second: f64,
    available: f64,
    bucket_size: f64,
    last_time: SystemTime,
}

impl LeakyBucket {
    pub(crate) fn new(bucket_size: f64, per_second: f64) -> LeakyBucket {
        LeakyBucket {
            per_second,
            available: bucket_size,
            bucket_size,
            last_time: SystemTime::now(),
        }
    }

    pub(crate) fn should_sample(&mut self) -> bool {
        self.check_availability(SystemTime::now)
    }

    fn check_availability<F>(&mut self, now: F) -> bool
    where
        F: Fn() -> SystemTime,
    {
        if self.available >= 1.0 {
            self.available -= 1.0;
            return true;
        }

        let cur_time = now();
        match cur_time.duration_since(self.last_time) {
            Ok(elapsed) => {
                self.last_time = cur_time;
                self.available = f64::min(
                    elapsed.as_secs_f64() * self.per_second + self.available,
                    self.bucket_size,
                );

                if self.available >= 1.0 {
                    self.available -= 1.0;
                    true
                } else {
                    false
                }
            }
            Err(_) => {
                self.last_time = cur_time;
                apm_context::apm_warn!(
                    name: "RateLimitingSampler.ClockRewind",
                    message = "wall clock moved backwards, sampling the trace"
                );
                true
            }
        }
    }
}
