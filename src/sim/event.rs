/// Events emitted during a simulation step.
/// The presentation layer consumes these for effects and screen changes.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelEvent {
    Jumped,
    /// Airborne → grounded transition that spawned landing dust.
    Landed,
    CoinCollected { total: u32 },
    LevelWon,
    LevelLost,
}
