//! Clocks used to time a trial.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Which clock a trial is measured against.
///
/// `Cpu` counts only time the process spent on a CPU, so I/O waits and
/// scheduling noise are excluded. `Wall` is elapsed real time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    #[default]
    Cpu,
    Wall,
}

impl Clock {
    /// Run `f` and return its result together with the elapsed time.
    pub fn measure<T>(self, f: impl FnOnce() -> T) -> (T, Duration) {
        match self {
            Clock::Wall => {
                let start = Instant::now();
                let out = f();
                (out, start.elapsed())
            }
            Clock::Cpu => match process_cpu_time() {
                Some(start) => {
                    let out = f();
                    let end = process_cpu_time().unwrap_or(start);
                    (out, end.saturating_sub(start))
                }
                None => Clock::Wall.measure(f),
            },
        }
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clock::Cpu => f.write_str("cpu"),
            Clock::Wall => f.write_str("wall"),
        }
    }
}

impl FromStr for Clock {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" | "process" => Ok(Clock::Cpu),
            "wall" | "real" => Ok(Clock::Wall),
            _ => Err(format!("Unknown clock: {s}. Valid options: cpu, wall")),
        }
    }
}

/// CPU time consumed by the whole process so far.
#[cfg(unix)]
pub fn process_cpu_time() -> Option<Duration> {
    use std::mem::MaybeUninit;

    let mut ts = MaybeUninit::<libc::timespec>::uninit();
    unsafe {
        // SAFETY: clock_gettime fully initializes ts when it returns 0
        if libc::clock_gettime(libc::CLOCK_PROCESS_CPUTIME_ID, ts.as_mut_ptr()) != 0 {
            return None;
        }
        let ts = ts.assume_init();
        Some(Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32))
    }
}

#[cfg(not(unix))]
pub fn process_cpu_time() -> Option<Duration> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spin(iterations: u64) -> u64 {
        let mut acc = 0u64;
        for i in 0..iterations {
            acc = acc.wrapping_mul(31).wrapping_add(std::hint::black_box(i));
        }
        acc
    }

    #[test]
    fn parse() {
        assert_eq!("CPU".parse::<Clock>().unwrap(), Clock::Cpu);
        assert_eq!("wall".parse::<Clock>().unwrap(), Clock::Wall);
        assert!("sundial".parse::<Clock>().is_err());
        assert_eq!(Clock::default(), Clock::Cpu);
        assert_eq!(Clock::Wall.to_string(), "wall");
    }

    #[test]
    fn measure_returns_the_result() {
        for clock in [Clock::Cpu, Clock::Wall] {
            let (out, elapsed) = clock.measure(|| spin(10_000));
            assert_eq!(out, spin(10_000));
            assert!(elapsed < Duration::from_secs(10));
        }
    }

    #[test]
    fn wall_clock_sees_sleep() {
        let (_, elapsed) = Clock::Wall.measure(|| std::thread::sleep(Duration::from_millis(5)));
        assert!(elapsed >= Duration::from_millis(5));
    }

    #[cfg(unix)]
    #[test]
    fn cpu_clock_is_monotonic() {
        let a = process_cpu_time().unwrap();
        spin(1_000_000);
        let b = process_cpu_time().unwrap();
        assert!(b >= a);
    }
}
