use std::fmt;

/// Named overlays the orchestrator asks the renderer to show.
///
/// The renderer maps each name to an asset; the core never touches pixels
/// of overlays itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overlay {
    Intro,
    /// Countdown step, 3 down to 1.
    Countdown(u8),
    Cheese,
    PleaseWait,
    PrintConfirm,
    Printing,
}

impl Overlay {
    /// Every overlay a renderer must be able to show.
    pub const ALL: [Overlay; 8] = [
        Overlay::Intro,
        Overlay::Countdown(3),
        Overlay::Countdown(2),
        Overlay::Countdown(1),
        Overlay::Cheese,
        Overlay::PleaseWait,
        Overlay::PrintConfirm,
        Overlay::Printing,
    ];

    /// Asset name, e.g. `countdown3` or `please_wait`.
    pub fn asset_name(&self) -> String {
        match self {
            Self::Intro => "intro".into(),
            Self::Countdown(step) => format!("countdown{}", step),
            Self::Cheese => "cheese".into(),
            Self::PleaseWait => "please_wait".into(),
            Self::PrintConfirm => "print_confirm".into(),
            Self::Printing => "printing".into(),
        }
    }
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.asset_name())
    }
}
