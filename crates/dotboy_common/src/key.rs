/// Frontend-neutral keyboard keys.
///
/// Runners translate their native key events into this enum; each core maps
/// the subset it cares about onto its own input lines.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Z,
    X,
    A,
    S,
    Enter,
    Backspace,
    Space,
    Escape,
}
