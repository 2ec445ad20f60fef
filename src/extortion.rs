/// Source of the gold amount a guard demands when shaking the party down.
///
/// The amount depends on game state (how far the campaign has progressed),
/// which this crate does not track. Scripts carry an extortion placeholder
/// command; whoever renders the script passes an evaluator in and the
/// amount is resolved at query time, not baked in during decode.
pub trait GuardExtortion {
    /// Gold demanded right now
    fn extortion_amount(&self) -> u16;
}

/// A fixed demand, enough for tools and tests.
#[derive(Debug, Clone, Copy)]
pub struct FlatRate(pub u16);

impl GuardExtortion for FlatRate {
    fn extortion_amount(&self) -> u16 {
        self.0
    }
}
