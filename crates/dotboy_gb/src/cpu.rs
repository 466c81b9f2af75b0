mod alu;
mod bus;
mod exec;
mod helpers;
mod instruction;
mod interrupts;
mod regs;

pub use bus::Bus;
pub use instruction::{Condition, Instruction, Op, Operand};
pub use interrupts::Interrupt;
pub use regs::{Flag, Reg16, Reg8, RegisterPair, Registers};

use instruction::{CB_TABLE, MAIN_TABLE};

const CB_PREFIX: u8 = 0xCB;

/// SM83 CPU core.
///
/// The CPU is clocked once per M-cycle. An instruction executes in full on
/// the first M-cycle of its slot; the remaining M-cycles of its cost are
/// then spent idle before the next fetch.
#[derive(Clone, Debug)]
pub struct Cpu {
    pub regs: Registers,
    pub ime: bool,
    pub halted: bool,
    /// EI was executed; IME turns on at the next instruction boundary.
    ime_enabling: bool,
    /// An illegal opcode hard-locked the CPU until reset.
    locked: bool,
    /// M-cycles left in the current instruction or interrupt slot.
    cycles_remaining: u8,
    main_table: &'static [Instruction; 256],
    cb_table: &'static [Instruction; 256],
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            regs: Registers::dmg(),
            ime: false,
            halted: false,
            ime_enabling: false,
            locked: false,
            cycles_remaining: 0,
            main_table: &*MAIN_TABLE,
            cb_table: &*CB_TABLE,
        }
    }

    /// Reset to the post-boot state. IME is clear when control reaches
    /// 0x0100; cartridge code enables interrupts itself.
    pub fn reset(&mut self) {
        self.regs = Registers::dmg();
        self.ime = false;
        self.halted = false;
        self.ime_enabling = false;
        self.locked = false;
        self.cycles_remaining = 0;
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Descriptor for a main-table opcode.
    #[inline]
    pub fn instruction(&self, opcode: u8) -> &'static Instruction {
        let table: &'static [Instruction; 256] = self.main_table;
        &table[opcode as usize]
    }

    /// Descriptor for the opcode following a 0xCB prefix.
    #[inline]
    pub fn cb_instruction(&self, opcode: u8) -> &'static Instruction {
        let table: &'static [Instruction; 256] = self.cb_table;
        &table[opcode as usize]
    }

    /// Advance by one M-cycle.
    pub fn clock<B: Bus>(&mut self, bus: &mut B) {
        if self.cycles_remaining == 0 {
            self.cycles_remaining = self.step(bus);
        }
        self.cycles_remaining = self.cycles_remaining.saturating_sub(1);
    }

    /// Run one instruction boundary: wake from HALT, take an interrupt or
    /// fetch and execute one instruction. Returns the M-cycles consumed.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> u8 {
        if self.locked {
            return 1;
        }

        let pending = self.pending_interrupts(bus);
        if self.halted && !pending.is_empty() {
            // Wakes even with IME clear.
            self.halted = false;
        }

        if self.ime && !self.halted && self.service_interrupt(bus, pending) {
            return interrupts::SERVICE_CYCLES;
        }

        if self.ime_enabling {
            self.ime = true;
            self.ime_enabling = false;
        }

        if self.halted {
            return 1;
        }

        let pc = self.regs.pc;
        let opcode = self.fetch8(bus);
        let instr = if opcode == CB_PREFIX {
            let cb = self.fetch8(bus);
            self.cb_table[cb as usize]
        } else {
            self.main_table[opcode as usize]
        };

        log::trace!(
            "PC=0x{:04X} op=0x{:02X} {} AF=0x{:04X} BC=0x{:04X} DE=0x{:04X} HL=0x{:04X} SP=0x{:04X}",
            pc,
            opcode,
            instr,
            self.regs.af(),
            self.regs.bc(),
            self.regs.de(),
            self.regs.hl(),
            self.regs.sp
        );

        let extra = self.execute(bus, &instr);
        instr.cycles + extra
    }

    /// Render the instruction at `addr` with its immediates resolved.
    ///
    /// Returns the text and the encoded length in bytes.
    pub fn disassemble<B: Bus>(&self, bus: &mut B, addr: u16) -> (String, u16) {
        let opcode = bus.read8(addr);
        let instr = if opcode == CB_PREFIX {
            self.cb_table[bus.read8(addr.wrapping_add(1)) as usize]
        } else {
            self.main_table[opcode as usize]
        };

        let len = instr.length();
        let imm_start = if opcode == CB_PREFIX { 2 } else { 1 };
        let imm: Vec<u8> = (imm_start..len)
            .map(|i| bus.read8(addr.wrapping_add(i)))
            .collect();
        let pc_after = addr.wrapping_add(len);

        let mut text = instr.mnemonic.to_string();
        let mut sep = " ";
        let mut offset = 0usize;
        for operand in [instr.lhs, instr.rhs] {
            let width = operand.immediate_len() as usize;
            let bytes = imm.get(offset..offset + width).unwrap_or(&[]);
            offset += width;
            if !instruction::visible(operand) {
                continue;
            }
            text.push_str(sep);
            text.push_str(&instruction::render_operand(instr.op, operand, bytes, pc_after));
            sep = ", ";
        }
        (text, len)
    }
}
