//! Events emitted during a simulation step: the discrete outcome
//! surface of a tick. Tests assert on these; the frontend may react
//! to them.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[allow(dead_code)]
pub enum GameEvent {
    /// A life was lost (hazard, enemy contact, or falling off).
    LifeLost { remaining: u32 },
    /// Last life spent; a full restart is pending.
    GameOver,
    /// Finish reached with more levels ahead. `next` is the new
    /// 0-based level index.
    LevelCleared { next: usize },
    /// Finish reached on the final level.
    GameWon,
    /// A level was (re)entered and play resumed.
    LevelActivated { level: usize },
}
