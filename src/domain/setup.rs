//! Trade setups: the immutable output of setup detection.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }

    /// Case-insensitive parse of `LONG` / `SHORT`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" => Some(Direction::Long),
            "SHORT" => Some(Direction::Short),
            _ => None,
        }
    }

    /// +1 for long, -1 for short.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrendState {
    Uptrend,
    Downtrend,
    Ranging,
}

impl TrendState {
    pub const ALL: [TrendState; 3] = [TrendState::Uptrend, TrendState::Downtrend, TrendState::Ranging];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendState::Uptrend => "uptrend",
            TrendState::Downtrend => "downtrend",
            TrendState::Ranging => "ranging",
        }
    }
}

impl fmt::Display for TrendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The family of pattern an evaluator recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SetupKind {
    EmaPullback,
    Breakout,
    OscillatorExtreme,
    RangeBounce,
    Momentum,
}

impl SetupKind {
    /// Default evaluation order.
    pub const ALL: [SetupKind; 5] = [
        SetupKind::EmaPullback,
        SetupKind::Breakout,
        SetupKind::OscillatorExtreme,
        SetupKind::RangeBounce,
        SetupKind::Momentum,
    ];

    /// Key used in the `[setups]` config section.
    pub fn config_key(&self) -> &'static str {
        match self {
            SetupKind::EmaPullback => "ema_pullback",
            SetupKind::Breakout => "breakout",
            SetupKind::OscillatorExtreme => "rsi_extreme",
            SetupKind::RangeBounce => "range_bounce",
            SetupKind::Momentum => "momentum",
        }
    }

    pub fn from_config_key(key: &str) -> Option<Self> {
        SetupKind::ALL.into_iter().find(|k| k.config_key() == key)
    }

    /// Report label combining kind and direction, e.g. `BREAKOUT_LONG`.
    pub fn label(&self, direction: Direction) -> &'static str {
        match (self, direction) {
            (SetupKind::EmaPullback, Direction::Long) => "EMA_PULLBACK_LONG",
            (SetupKind::EmaPullback, Direction::Short) => "EMA_PULLBACK_SHORT",
            (SetupKind::Breakout, Direction::Long) => "BREAKOUT_LONG",
            (SetupKind::Breakout, Direction::Short) => "BREAKOUT_SHORT",
            (SetupKind::OscillatorExtreme, Direction::Long) => "RSI_OVERSOLD_LONG",
            (SetupKind::OscillatorExtreme, Direction::Short) => "RSI_OVERBOUGHT_SHORT",
            (SetupKind::RangeBounce, Direction::Long) => "RANGE_BOUNCE_LONG",
            (SetupKind::RangeBounce, Direction::Short) => "RANGE_BOUNCE_SHORT",
            (SetupKind::Momentum, Direction::Long) => "MOMENTUM_LONG",
            (SetupKind::Momentum, Direction::Short) => "MOMENTUM_SHORT",
        }
    }
}

impl fmt::Display for SetupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

/// A detected trade opportunity. Never mutated after detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Setup {
    pub symbol: String,
    pub kind: SetupKind,
    pub direction: Direction,
    pub score: f64,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub reason: String,
    pub trend: TrendState,
}

impl Setup {
    pub fn type_name(&self) -> &'static str {
        self.kind.label(self.direction)
    }

    /// Long: stop < entry < target. Short: target < entry < stop.
    pub fn is_well_formed(&self) -> bool {
        let finite = self.entry.is_finite() && self.stop.is_finite() && self.target.is_finite();
        finite
            && match self.direction {
                Direction::Long => self.stop < self.entry && self.entry < self.target,
                Direction::Short => self.target < self.entry && self.entry < self.stop,
            }
    }
}
