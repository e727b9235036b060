/// behaviours where interpreters disagree, or where we deliberately differ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Quirks {
    /// EXA1 is meant to skip when the key is *up*; classic behaviour here
    /// checks for down, same as EX9E. set this to get the documented version
    pub key_up_skip_checks_release: bool,
}

/// knobs for an interpreter instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// upper bound on instructions executed per wall-clock second
    pub instructions_per_second: u32,
    /// delay/sound timer rate
    pub timer_hz: u32,
    /// fixed seed for CXNN; `None` uses OS entropy
    pub seed: Option<u64>,
    /// stop after this many loop cycles
    pub max_cycles: Option<u64>,
    pub quirks: Quirks,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instructions_per_second: 700,
            timer_hz: 60,
            seed: None,
            max_cycles: None,
            quirks: Quirks::default(),
        }
    }
}
