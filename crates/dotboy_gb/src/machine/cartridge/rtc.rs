use std::time::{Duration, SystemTime};

/// MBC3 clock registers as the cartridge exposes them.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
struct RtcRegisters {
    seconds: u8,
    minutes: u8,
    hours: u8,
    /// 9-bit day counter.
    days: u16,
    halt: bool,
    carry: bool,
}

impl RtcRegisters {
    /// Register 0x0C: bit 0 day bit 8, bit 6 halt, bit 7 day carry.
    fn control_byte(&self) -> u8 {
        let mut out = ((self.days >> 8) as u8) & 0x01;
        if self.halt {
            out |= 0x40;
        }
        if self.carry {
            out |= 0x80;
        }
        out
    }
}

/// Wall-clock driven MBC3 real-time clock.
///
/// The live registers are brought up to date lazily from `last_update`
/// whenever the cartridge touches the clock. Reads always see the copy
/// captured by the last latch.
#[derive(Clone, Debug)]
pub(super) struct Rtc {
    regs: RtcRegisters,
    latched: RtcRegisters,
    last_update: SystemTime,
    subsecond: Duration,
}

impl Rtc {
    pub(super) fn new(now: SystemTime) -> Self {
        Self {
            regs: RtcRegisters::default(),
            latched: RtcRegisters::default(),
            last_update: now,
            subsecond: Duration::ZERO,
        }
    }

    pub(super) fn latch(&mut self, now: SystemTime) {
        self.sync(now);
        self.latched = self.regs;
    }

    pub(super) fn read(&self, reg: u8) -> u8 {
        match reg {
            0x08 => self.latched.seconds & 0x3F,
            0x09 => self.latched.minutes & 0x3F,
            0x0A => self.latched.hours & 0x1F,
            0x0B => (self.latched.days & 0x00FF) as u8,
            0x0C => self.latched.control_byte(),
            _ => 0xFF,
        }
    }

    /// Writing any register rebases the clock at `now`.
    pub(super) fn write(&mut self, reg: u8, value: u8, now: SystemTime) {
        self.sync(now);
        match reg {
            0x08 => {
                self.regs.seconds = value & 0x3F;
                self.subsecond = Duration::ZERO;
            }
            0x09 => self.regs.minutes = value & 0x3F,
            0x0A => self.regs.hours = value & 0x1F,
            0x0B => self.regs.days = (self.regs.days & 0x0100) | value as u16,
            0x0C => {
                self.regs.days = (self.regs.days & 0x00FF) | (((value & 0x01) as u16) << 8);
                self.regs.halt = value & 0x40 != 0;
                self.regs.carry = value & 0x80 != 0;
            }
            _ => {}
        }
        self.latched = self.regs;
    }

    fn sync(&mut self, now: SystemTime) {
        // A clock that went backwards contributes nothing.
        let elapsed = now.duration_since(self.last_update).unwrap_or_default();
        self.last_update = now;
        if self.regs.halt {
            return;
        }

        let total = self.subsecond + elapsed;
        self.subsecond = Duration::from_nanos(total.subsec_nanos() as u64);
        self.advance_seconds(total.as_secs());
    }

    fn advance_seconds(&mut self, mut seconds: u64) {
        while seconds > 0 {
            let until_minute_tick = self.seconds_until_minute_tick();
            if seconds < until_minute_tick {
                self.regs.seconds = ((self.regs.seconds as u64 + seconds) & 0x3F) as u8;
                return;
            }
            seconds -= until_minute_tick;
            self.regs.seconds = 0;
            self.minute_tick();
        }
    }

    /// Out-of-range values written by software count up to 63 and wrap.
    fn seconds_until_minute_tick(&self) -> u64 {
        let sec = self.regs.seconds as u64;
        if sec <= 59 {
            60 - sec
        } else {
            (64 - sec) + 60
        }
    }

    fn minute_tick(&mut self) {
        if self.regs.minutes == 59 {
            self.regs.minutes = 0;
            self.hour_tick();
        } else {
            self.regs.minutes = (self.regs.minutes + 1) & 0x3F;
        }
    }

    fn hour_tick(&mut self) {
        if self.regs.hours == 23 {
            self.regs.hours = 0;
            self.day_tick();
        } else {
            self.regs.hours = (self.regs.hours + 1) & 0x1F;
        }
    }

    fn day_tick(&mut self) {
        if self.regs.days >= 0x01FF {
            self.regs.days = 0;
            self.regs.carry = true;
        } else {
            self.regs.days += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn latch_captures_elapsed_wall_time() {
        let mut rtc = Rtc::new(at(1_000));
        rtc.latch(at(1_000 + 90_061)); // 1 day, 1 hour, 1 minute, 1 second

        assert_eq!(rtc.read(0x08), 1);
        assert_eq!(rtc.read(0x09), 1);
        assert_eq!(rtc.read(0x0A), 1);
        assert_eq!(rtc.read(0x0B), 1);
        assert_eq!(rtc.read(0x0C), 0);
    }

    #[test]
    fn reads_hold_the_latched_copy() {
        let mut rtc = Rtc::new(at(0));
        rtc.latch(at(5));
        rtc.sync(at(50));
        assert_eq!(rtc.read(0x08), 5);
        rtc.latch(at(50));
        assert_eq!(rtc.read(0x08), 50);
    }

    #[test]
    fn halt_freezes_the_clock() {
        let mut rtc = Rtc::new(at(0));
        rtc.write(0x0C, 0x40, at(0));
        rtc.latch(at(3_600));
        assert_eq!(rtc.read(0x08), 0);
        assert_eq!(rtc.read(0x0C), 0x40);

        rtc.write(0x0C, 0x00, at(3_600));
        rtc.latch(at(3_610));
        assert_eq!(rtc.read(0x08), 10);
    }

    #[test]
    fn day_counter_overflow_sets_sticky_carry() {
        let mut rtc = Rtc::new(at(0));
        rtc.write(0x0B, 0xFF, at(0));
        rtc.write(0x0C, 0x01, at(0));
        rtc.write(0x0A, 23, at(0));
        rtc.write(0x09, 59, at(0));
        rtc.write(0x08, 59, at(0));

        rtc.latch(at(1));
        assert_eq!(rtc.read(0x0B), 0);
        assert_eq!(rtc.read(0x0C), 0x80);

        rtc.latch(at(86_401));
        assert_eq!(rtc.read(0x0B), 1);
        assert_eq!(rtc.read(0x0C) & 0x80, 0x80);
    }
}
