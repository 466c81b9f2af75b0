use std::fmt;

use super::regs::{Reg16, Reg8};

/// Branch condition carried by JP/JR/CALL/RET descriptors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Condition {
    Always,
    Z,
    NZ,
    C,
    NC,
}

/// Operand descriptor.
///
/// Every addressing behaviour gets its own tag; a 16-bit immediate value and
/// a 16-bit immediate address are never the same variant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operand {
    None,
    /// 8-bit immediate value.
    Imm8,
    /// 16-bit immediate value.
    Imm16,
    /// Signed 8-bit immediate (JR, ADD SP and LD HL,SP+e).
    Offset8,
    Reg8(Reg8),
    Reg16(Reg16),
    /// Memory at the address held in a 16-bit register.
    Indirect(Reg16),
    /// `(HL+)`: memory at HL, HL incremented when the address is resolved.
    IndirectHlInc,
    /// `(HL-)`: memory at HL, HL decremented when the address is resolved.
    IndirectHlDec,
    /// Zero page `(0xFF00 + n8)`.
    IndirectImm8,
    /// Memory at a 16-bit immediate address.
    IndirectImm16,
    /// Zero page `(0xFF00 + r8)`.
    IndirectReg8(Reg8),
    Cond(Condition),
    /// Bit index for BIT/RES/SET.
    Bit(u8),
    /// Fixed RST vector.
    Target(u16),
}

impl Operand {
    /// Number of immediate bytes this operand consumes from the stream.
    pub const fn immediate_len(self) -> u16 {
        match self {
            Operand::Imm8 | Operand::Offset8 | Operand::IndirectImm8 => 1,
            Operand::Imm16 | Operand::IndirectImm16 => 2,
            _ => 0,
        }
    }

    /// Whether the operand moves a 16-bit value.
    pub const fn is_wide(self) -> bool {
        matches!(self, Operand::Imm16 | Operand::Reg16(_))
    }
}

/// Execution handler tag. The CPU dispatches on this with a single match.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Op {
    Nop,
    Halt,
    Stop,
    Ld,
    LdHlSp,
    Inc,
    Dec,
    Add,
    AddSp,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
    Push,
    Pop,
    Jp,
    JpHl,
    Jr,
    Call,
    Ret,
    Reti,
    Rst,
    Rlca,
    Rla,
    Rrca,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Di,
    Ei,
    Prefix,
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
    Bit,
    Res,
    Set,
    Illegal,
}

/// Immutable decoded instruction.
///
/// `cycles` is the base cost in M-cycles, including the CB prefix for the
/// CB table. Conditional branches report their taken penalty at execution.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Instruction {
    pub mnemonic: &'static str,
    pub cycles: u8,
    pub op: Op,
    pub lhs: Operand,
    pub rhs: Operand,
}

impl Instruction {
    const fn new(mnemonic: &'static str, cycles: u8, op: Op, lhs: Operand, rhs: Operand) -> Self {
        Self {
            mnemonic,
            cycles,
            op,
            lhs,
            rhs,
        }
    }

    const fn implied(mnemonic: &'static str, cycles: u8, op: Op) -> Self {
        Self::new(mnemonic, cycles, op, Operand::None, Operand::None)
    }

    const ILLEGAL: Instruction = Instruction::implied("ILLEGAL", 1, Op::Illegal);

    /// Encoded length in bytes, opcode (and prefix) included.
    pub fn length(&self) -> u16 {
        let prefix = if matches!(
            self.op,
            Op::Rlc
                | Op::Rrc
                | Op::Rl
                | Op::Rr
                | Op::Sla
                | Op::Sra
                | Op::Swap
                | Op::Srl
                | Op::Bit
                | Op::Res
                | Op::Set
        ) {
            2
        } else {
            1
        };
        // STOP carries one padding byte.
        let padding = if self.op == Op::Stop { 1 } else { 0 };
        prefix + padding + self.lhs.immediate_len() + self.rhs.immediate_len()
    }
}

const R8: [Operand; 8] = [
    Operand::Reg8(Reg8::B),
    Operand::Reg8(Reg8::C),
    Operand::Reg8(Reg8::D),
    Operand::Reg8(Reg8::E),
    Operand::Reg8(Reg8::H),
    Operand::Reg8(Reg8::L),
    Operand::Indirect(Reg16::HL),
    Operand::Reg8(Reg8::A),
];

const RP: [Reg16; 4] = [Reg16::BC, Reg16::DE, Reg16::HL, Reg16::SP];
const RP2: [Reg16; 4] = [Reg16::BC, Reg16::DE, Reg16::HL, Reg16::AF];
const CC: [Condition; 4] = [Condition::NZ, Condition::Z, Condition::NC, Condition::C];

const A: Operand = Operand::Reg8(Reg8::A);
const HL: Operand = Operand::Reg16(Reg16::HL);
const SP: Operand = Operand::Reg16(Reg16::SP);
const ALWAYS: Operand = Operand::Cond(Condition::Always);

fn alu_op(index: u8) -> (&'static str, Op) {
    match index & 7 {
        0 => ("ADD", Op::Add),
        1 => ("ADC", Op::Adc),
        2 => ("SUB", Op::Sub),
        3 => ("SBC", Op::Sbc),
        4 => ("AND", Op::And),
        5 => ("XOR", Op::Xor),
        6 => ("OR", Op::Or),
        _ => ("CP", Op::Cp),
    }
}

fn rotate_op(index: u8) -> (&'static str, Op) {
    match index & 7 {
        0 => ("RLC", Op::Rlc),
        1 => ("RRC", Op::Rrc),
        2 => ("RL", Op::Rl),
        3 => ("RR", Op::Rr),
        4 => ("SLA", Op::Sla),
        5 => ("SRA", Op::Sra),
        6 => ("SWAP", Op::Swap),
        _ => ("SRL", Op::Srl),
    }
}

#[inline]
fn is_memory(operand: Operand) -> bool {
    matches!(operand, Operand::Indirect(_))
}

/// Decode one main-table opcode.
///
/// The opcode is split into the usual `xx yyy zzz` fields; every one of the
/// 256 values lands on exactly one arm, holes included.
pub(super) fn decode(opcode: u8) -> Instruction {
    use Instruction as I;

    let x = opcode >> 6;
    let y = (opcode >> 3) & 7;
    let z = opcode & 7;
    let p = (y >> 1) as usize;
    let q = y & 1;

    match (x, z) {
        (0, 0) => match y {
            0 => I::implied("NOP", 1, Op::Nop),
            1 => I::new("LD", 5, Op::Ld, Operand::IndirectImm16, SP),
            2 => I::implied("STOP", 1, Op::Stop),
            3 => I::new("JR", 2, Op::Jr, ALWAYS, Operand::Offset8),
            _ => I::new(
                "JR",
                2,
                Op::Jr,
                Operand::Cond(CC[(y - 4) as usize]),
                Operand::Offset8,
            ),
        },
        (0, 1) => {
            let rp = Operand::Reg16(RP[p]);
            if q == 0 {
                I::new("LD", 3, Op::Ld, rp, Operand::Imm16)
            } else {
                I::new("ADD", 2, Op::Add, HL, rp)
            }
        }
        (0, 2) => {
            let mem = match p {
                0 => Operand::Indirect(Reg16::BC),
                1 => Operand::Indirect(Reg16::DE),
                2 => Operand::IndirectHlInc,
                _ => Operand::IndirectHlDec,
            };
            if q == 0 {
                I::new("LD", 2, Op::Ld, mem, A)
            } else {
                I::new("LD", 2, Op::Ld, A, mem)
            }
        }
        (0, 3) => {
            let rp = Operand::Reg16(RP[p]);
            if q == 0 {
                I::new("INC", 2, Op::Inc, rp, Operand::None)
            } else {
                I::new("DEC", 2, Op::Dec, rp, Operand::None)
            }
        }
        (0, 4) => {
            let r = R8[y as usize];
            let cycles = if is_memory(r) { 3 } else { 1 };
            I::new("INC", cycles, Op::Inc, r, Operand::None)
        }
        (0, 5) => {
            let r = R8[y as usize];
            let cycles = if is_memory(r) { 3 } else { 1 };
            I::new("DEC", cycles, Op::Dec, r, Operand::None)
        }
        (0, 6) => {
            let r = R8[y as usize];
            let cycles = if is_memory(r) { 3 } else { 2 };
            I::new("LD", cycles, Op::Ld, r, Operand::Imm8)
        }
        (0, _) => match y {
            0 => I::implied("RLCA", 1, Op::Rlca),
            1 => I::implied("RRCA", 1, Op::Rrca),
            2 => I::implied("RLA", 1, Op::Rla),
            3 => I::implied("RRA", 1, Op::Rra),
            4 => I::implied("DAA", 1, Op::Daa),
            5 => I::implied("CPL", 1, Op::Cpl),
            6 => I::implied("SCF", 1, Op::Scf),
            _ => I::implied("CCF", 1, Op::Ccf),
        },
        (1, _) => {
            if y == 6 && z == 6 {
                return I::implied("HALT", 1, Op::Halt);
            }
            let dst = R8[y as usize];
            let src = R8[z as usize];
            let cycles = if is_memory(dst) || is_memory(src) { 2 } else { 1 };
            I::new("LD", cycles, Op::Ld, dst, src)
        }
        (2, _) => {
            let (mnemonic, op) = alu_op(y);
            let src = R8[z as usize];
            let cycles = if is_memory(src) { 2 } else { 1 };
            I::new(mnemonic, cycles, op, A, src)
        }
        (_, 0) => match y {
            0..=3 => I::new("RET", 2, Op::Ret, Operand::Cond(CC[y as usize]), Operand::None),
            4 => I::new("LDH", 3, Op::Ld, Operand::IndirectImm8, A),
            5 => I::new("ADD", 4, Op::AddSp, SP, Operand::Offset8),
            6 => I::new("LDH", 3, Op::Ld, A, Operand::IndirectImm8),
            _ => I::new("LD", 3, Op::LdHlSp, HL, Operand::Offset8),
        },
        (_, 1) => {
            if q == 0 {
                return I::new("POP", 3, Op::Pop, Operand::Reg16(RP2[p]), Operand::None);
            }
            match p {
                0 => I::new("RET", 1, Op::Ret, ALWAYS, Operand::None),
                1 => I::implied("RETI", 4, Op::Reti),
                2 => I::new("JP", 1, Op::JpHl, HL, Operand::None),
                _ => I::new("LD", 2, Op::Ld, SP, HL),
            }
        }
        (_, 2) => match y {
            0..=3 => I::new(
                "JP",
                3,
                Op::Jp,
                Operand::Cond(CC[y as usize]),
                Operand::Imm16,
            ),
            4 => I::new("LD", 2, Op::Ld, Operand::IndirectReg8(Reg8::C), A),
            5 => I::new("LD", 4, Op::Ld, Operand::IndirectImm16, A),
            6 => I::new("LD", 2, Op::Ld, A, Operand::IndirectReg8(Reg8::C)),
            _ => I::new("LD", 4, Op::Ld, A, Operand::IndirectImm16),
        },
        (_, 3) => match y {
            0 => I::new("JP", 3, Op::Jp, ALWAYS, Operand::Imm16),
            1 => I::implied("PREFIX", 1, Op::Prefix),
            6 => I::implied("DI", 1, Op::Di),
            7 => I::implied("EI", 1, Op::Ei),
            _ => I::ILLEGAL,
        },
        (_, 4) => match y {
            0..=3 => I::new(
                "CALL",
                3,
                Op::Call,
                Operand::Cond(CC[y as usize]),
                Operand::Imm16,
            ),
            _ => I::ILLEGAL,
        },
        (_, 5) => {
            if q == 0 {
                I::new("PUSH", 4, Op::Push, Operand::Reg16(RP2[p]), Operand::None)
            } else if p == 0 {
                I::new("CALL", 3, Op::Call, ALWAYS, Operand::Imm16)
            } else {
                I::ILLEGAL
            }
        }
        (_, 6) => {
            let (mnemonic, op) = alu_op(y);
            I::new(mnemonic, 2, op, A, Operand::Imm8)
        }
        _ => I::new(
            "RST",
            4,
            Op::Rst,
            Operand::Target((y as u16) * 8),
            Operand::None,
        ),
    }
}

/// Decode one CB-prefixed opcode. Cycle counts include the prefix fetch.
pub(super) fn decode_cb(opcode: u8) -> Instruction {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 7;
    let r = R8[(opcode & 7) as usize];
    let memory = is_memory(r);

    match x {
        0 => {
            let (mnemonic, op) = rotate_op(y);
            Instruction::new(mnemonic, if memory { 4 } else { 2 }, op, r, Operand::None)
        }
        1 => Instruction::new("BIT", if memory { 3 } else { 2 }, Op::Bit, Operand::Bit(y), r),
        2 => Instruction::new("RES", if memory { 4 } else { 2 }, Op::Res, Operand::Bit(y), r),
        _ => Instruction::new("SET", if memory { 4 } else { 2 }, Op::Set, Operand::Bit(y), r),
    }
}

fn build_table(decoder: fn(u8) -> Instruction) -> [Instruction; 256] {
    let mut table = [Instruction::ILLEGAL; 256];
    for (opcode, slot) in table.iter_mut().enumerate() {
        *slot = decoder(opcode as u8);
    }
    table
}

lazy_static::lazy_static! {
    /// Main dispatch table, indexed by opcode byte.
    pub(super) static ref MAIN_TABLE: [Instruction; 256] = build_table(decode);
    /// CB-prefixed dispatch table, indexed by the byte after 0xCB.
    pub(super) static ref CB_TABLE: [Instruction; 256] = build_table(decode_cb);
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Condition::Always => "",
            Condition::Z => "Z",
            Condition::NZ => "NZ",
            Condition::C => "C",
            Condition::NC => "NC",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::None => Ok(()),
            Operand::Imm8 => f.write_str("n8"),
            Operand::Imm16 => f.write_str("n16"),
            Operand::Offset8 => f.write_str("e8"),
            Operand::Reg8(r) => write!(f, "{r}"),
            Operand::Reg16(r) => write!(f, "{r}"),
            Operand::Indirect(r) => write!(f, "({r})"),
            Operand::IndirectHlInc => f.write_str("(HL+)"),
            Operand::IndirectHlDec => f.write_str("(HL-)"),
            Operand::IndirectImm8 => f.write_str("(a8)"),
            Operand::IndirectImm16 => f.write_str("(a16)"),
            Operand::IndirectReg8(r) => write!(f, "({r})"),
            Operand::Cond(c) => write!(f, "{c}"),
            Operand::Bit(b) => write!(f, "{b}"),
            Operand::Target(t) => write!(f, "${t:02X}"),
        }
    }
}

/// Operand text with immediates substituted, used by the disassembler.
pub(super) fn render_operand(op: Op, operand: Operand, imm: &[u8], pc_after: u16) -> String {
    match operand {
        Operand::Imm8 => format!("${:02X}", imm.first().copied().unwrap_or(0)),
        Operand::Imm16 => format!("${:04X}", u16::from_le_bytes(imm16(imm))),
        Operand::IndirectImm8 => format!("($FF{:02X})", imm.first().copied().unwrap_or(0)),
        Operand::IndirectImm16 => format!("(${:04X})", u16::from_le_bytes(imm16(imm))),
        Operand::Offset8 => {
            let e = imm.first().copied().unwrap_or(0) as i8;
            match op {
                Op::Jr => format!("${:04X}", pc_after.wrapping_add(e as i16 as u16)),
                Op::LdHlSp => format!("SP{e:+}"),
                _ => format!("{e:+}"),
            }
        }
        other => other.to_string(),
    }
}

fn imm16(imm: &[u8]) -> [u8; 2] {
    [
        imm.first().copied().unwrap_or(0),
        imm.get(1).copied().unwrap_or(0),
    ]
}

pub(super) fn visible(operand: Operand) -> bool {
    !matches!(operand, Operand::None | Operand::Cond(Condition::Always))
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic)?;
        let mut sep = " ";
        for operand in [self.lhs, self.rhs] {
            if !visible(operand) {
                continue;
            }
            if self.op == Op::LdHlSp && operand == Operand::Offset8 {
                write!(f, "{sep}SP+e8")?;
            } else {
                write!(f, "{sep}{operand}")?;
            }
            sep = ", ";
        }
        Ok(())
    }
}
