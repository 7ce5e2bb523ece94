//! Configuration and CLI argument handling

use std::time::Duration;

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "pomodorod")]
#[command(about = "A work/rest interval timer controlled by SIGUSR1 (stop/start) and SIGUSR2 (pause/resume)")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Length of each work session (e.g. 25m, 1h30m, 90s; units h, m, s, ms, us, ns)
    #[arg(long = "ptime", visible_alias = "work", default_value = "25m", value_parser = parse_duration)]
    pub work_time: Duration,

    /// Length of each rest session
    #[arg(long = "rtime", visible_alias = "rest", default_value = "5m", value_parser = parse_duration)]
    pub rest_time: Duration,

    /// Program used to prompt at the end of each session
    #[arg(long, default_value = "dmenu")]
    pub prompt_command: String,

    /// Do not prompt at session boundaries
    #[arg(long)]
    pub no_prompt: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Session lengths used by the controller for the whole process lifetime.
    ///
    /// At least one of the two sessions must last a tick or more, otherwise
    /// the cycle would spin without ever waiting.
    pub fn session_config(&self) -> Result<SessionConfig, String> {
        let config = SessionConfig::new(self.work_time, self.rest_time);
        if config.ticks_for(config.work) == 0 && config.ticks_for(config.rest) == 0 {
            return Err(format!(
                "work ({:?}) and rest ({:?}) cannot both be zero",
                self.work_time, self.rest_time
            ));
        }
        Ok(config)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

/// Immutable session lengths plus the tick unit they are counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub work: Duration,
    pub rest: Duration,
    pub tick: Duration,
}

impl SessionConfig {
    /// Session lengths counted in one-second ticks
    pub fn new(work: Duration, rest: Duration) -> Self {
        Self {
            work,
            rest,
            tick: Duration::from_secs(1),
        }
    }

    /// Override the tick unit
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Number of ticks a session of `duration` lasts, rounded up.
    ///
    /// A partial trailing tick still costs a whole tick, so `1.5s` is two ticks.
    pub fn ticks_for(&self, duration: Duration) -> u64 {
        let tick = self.tick.as_nanos().max(1);
        let total = duration.as_nanos();
        let ticks = total / tick + u128::from(total % tick != 0);
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(25 * 60), Duration::from_secs(5 * 60))
    }
}

/// Parse a duration such as `25m`, `1h30m`, `90s`, `1.5s` or `250ms`.
///
/// Units are `h`, `m`, `s`, `ms`, `us` (or `µs`/`μs`) and `ns`.
///
/// A bare `0` is accepted. A leading `-` yields a zero duration.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let text = input.trim();
    if text.is_empty() {
        return Err("empty duration".to_string());
    }

    let (negative, text) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_nanos: u128 = 0;
    let mut rest = text;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration '{}'", input))?;
        if number_len == 0 {
            return Err(format!("invalid duration '{}'", input));
        }
        let number = &rest[..number_len];
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit_nanos: u128 = match &rest[..unit_len] {
            "h" => 3_600_000_000_000,
            "m" => 60_000_000_000,
            "s" => 1_000_000_000,
            "ms" => 1_000_000,
            "us" | "\u{b5}s" | "\u{3bc}s" => 1_000,
            "ns" => 1,
            unit => return Err(format!("unknown unit '{}' in duration '{}'", unit, input)),
        };
        rest = &rest[unit_len..];

        total_nanos = total_nanos
            .checked_add(scaled_nanos(number, unit_nanos).ok_or_else(|| format!("invalid number in duration '{}'", input))?)
            .ok_or_else(|| format!("duration '{}' out of range", input))?;
    }

    if negative {
        return Ok(Duration::ZERO);
    }

    let secs = u64::try_from(total_nanos / 1_000_000_000)
        .map_err(|_| format!("duration '{}' out of range", input))?;
    // Remainder is always below one second
    let nanos = (total_nanos % 1_000_000_000) as u32;
    Ok(Duration::new(secs, nanos))
}

/// `number` (digits with at most one `.`) times `unit_nanos`, truncated to
/// whole nanoseconds
fn scaled_nanos(number: &str, unit_nanos: u128) -> Option<u128> {
    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (number, ""),
    };
    if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
        return None;
    }

    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(unit_nanos)?;

    // Digits past nanosecond precision of the largest unit cannot matter
    let fraction = &fraction[..fraction.len().min(18)];
    if !fraction.is_empty() {
        let digits: u128 = fraction.parse().ok()?;
        let scale = 10u128.pow(fraction.len() as u32);
        nanos = nanos.checked_add(digits * unit_nanos / scale)?;
    }
    Some(nanos)
}
