/// The eight DMG buttons.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Button {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Button {
    /// Group (`true` for the action buttons) and bit within the P1 nibble.
    const fn line(self) -> (bool, u8) {
        match self {
            Button::Right => (false, 0),
            Button::Left => (false, 1),
            Button::Up => (false, 2),
            Button::Down => (false, 3),
            Button::A => (true, 0),
            Button::B => (true, 1),
            Button::Select => (true, 2),
            Button::Start => (true, 3),
        }
    }
}

/// P1/JOYP (FF00) state.
///
/// `buttons` and `dpad` use bit=1 for "pressed"; the register itself is
/// active-low and computed on read.
pub(crate) struct Joypad {
    select: u8,
    buttons: u8,
    dpad: u8,
}

impl Default for Joypad {
    fn default() -> Self {
        Self {
            // No group selected.
            select: 0x30,
            buttons: 0,
            dpad: 0,
        }
    }
}

impl Joypad {
    pub(crate) fn read(&self) -> u8 {
        // Bits 7-6 always read as 1.
        let mut low = 0x0F;
        if (self.select & 0x10) == 0 {
            low &= !self.dpad & 0x0F;
        }
        if (self.select & 0x20) == 0 {
            low &= !self.buttons & 0x0F;
        }
        0xC0 | self.select | low
    }

    pub(crate) fn write(&mut self, value: u8) {
        // Only the selection bits are writable.
        self.select = value & 0x30;
    }

    /// Update one button. Returns `true` on a press edge, which raises the
    /// joypad interrupt.
    pub(crate) fn set(&mut self, button: Button, pressed: bool) -> bool {
        let (action, bit) = button.line();
        let mask = 1u8 << bit;
        let group = if action {
            &mut self.buttons
        } else {
            &mut self.dpad
        };
        let was_pressed = (*group & mask) != 0;
        if pressed {
            *group |= mask;
        } else {
            *group &= !mask;
        }
        pressed && !was_pressed
    }
}
