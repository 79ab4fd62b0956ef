use std::{
    fmt::{self, Display},
    iter::{once, repeat, repeat_n},
};

/// a bracketed bar, `value` cells full out of `width`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Meter {
    pub value: usize,
    pub width: usize,
}

// === impl Meter ===

impl Meter {
    const ACTIVE: char = '█';
    const IDLE: char = ' ';
    const BORDER_L: char = '[';
    const BORDER_R: char = ']';

    /// a meter showing `percent`, out of 100.
    pub fn percent(percent: f64, width: usize) -> Self {
        let share = if percent.is_finite() {
            percent.clamp(0.0, 100.0) / 100.0
        } else {
            0.0
        };
        let value = (share * width as f64).round() as usize;

        Self { value, width }
    }
}

impl Display for Meter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { value, width } = *self;

        let meter = {
            let active = repeat_n(Self::ACTIVE, value.min(width));
            let idle = repeat(Self::IDLE);
            active.chain(idle).take(width)
        };
        let meter = once(Self::BORDER_L)
            .chain(meter)
            .chain(once(Self::BORDER_R))
            .collect::<String>();

        f.write_str(&meter)
    }
}
