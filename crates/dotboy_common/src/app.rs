use crate::key::Key;

/// A machine that a runner can drive one frame at a time.
///
/// `update` must leave `screen` holding a fully rendered frame: runners never
/// observe a frame that is still being drawn.
pub trait App {
    fn init(&mut self);
    fn update(&mut self, screen: &mut [u8]);
    fn handle_key_event(&mut self, key: Key, is_down: bool);
    fn should_exit(&self) -> bool;
    fn exit(&mut self);

    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn title(&self) -> String;
}
