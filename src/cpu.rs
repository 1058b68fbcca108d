//! ARM7TDMI shell as the façade consumes it: the register file with mode
//! banking, the hot-pluggable component slots, and the run loops that
//! drive the board clock between scheduled events.

use std::rc::Rc;

use crate::board::{Board, IdleOptimization};
use crate::cheats::CheatDevice;
use crate::debugger::Debugger;
use crate::memmap::VIDEO_HORIZONTAL_LENGTH;

pub const CPSR_T: u32 = 0x20;
pub const MODE_SVC: u32 = 0x13;
pub const MODE_IRQ_FIQ_DISABLE: u32 = 0xC0;

/// Fixed component slots. Attachment order is part of the contract; the
/// debugger always outranks the cheat device.
pub const CPU_COMPONENT_DEBUGGER: usize = 0;
pub const CPU_COMPONENT_CHEAT_DEVICE: usize = 1;
pub const CPU_COMPONENT_MAX: usize = 4;

pub enum CpuComponent {
    Debugger(Rc<Debugger>),
    Cheats(CheatDevice),
}

/// When no event is scheduled the loop still has to make forward progress;
/// it burns one scanline's worth of cycles per pass.
pub const LOOP_QUANTUM: u64 = VIDEO_HORIZONTAL_LENGTH as u64;

pub struct Cpu {
    pub gprs: [i32; 16],
    pub cpsr: u32,
    pub spsr: u32,
    pub banked_spsrs: [u32; 5],
    pub halted: bool,
    components: [Option<CpuComponent>; CPU_COMPONENT_MAX],
}

impl Default for Cpu {
    fn default() -> Self {
        Self {
            gprs: [0; 16],
            cpsr: MODE_SVC | MODE_IRQ_FIQ_DISABLE,
            spsr: 0,
            banked_spsrs: [0; 5],
            halted: false,
            components: [const { None }; CPU_COMPONENT_MAX],
        }
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.gprs = [0; 16];
        self.cpsr = MODE_SVC | MODE_IRQ_FIQ_DISABLE;
        self.spsr = 0;
        self.banked_spsrs = [0; 5];
        self.halted = false;
        self.write_pc(0);
    }

    pub fn is_thumb(&self) -> bool {
        self.cpsr & CPSR_T != 0
    }

    fn instruction_width(&self) -> i32 {
        if self.is_thumb() { 2 } else { 4 }
    }

    /// Write the program counter with a pipeline refill: the stored value
    /// reads back as the aligned target plus one fetch.
    pub fn write_pc(&mut self, value: i32) {
        let value = if self.is_thumb() {
            (value & !1).wrapping_add(2)
        } else {
            (value & !3).wrapping_add(4)
        };
        self.gprs[15] = value;
    }

    pub fn attach_component(&mut self, slot: usize, component: CpuComponent) {
        self.components[slot] = Some(component);
    }

    pub fn detach_component(&mut self, slot: usize) -> Option<CpuComponent> {
        self.components[slot].take()
    }

    pub fn component(&self, slot: usize) -> Option<&CpuComponent> {
        self.components[slot].as_ref()
    }

    pub fn component_mut(&mut self, slot: usize) -> Option<&mut CpuComponent> {
        self.components[slot].as_mut()
    }

    /// Advance until the next scheduled event fires, then service it.
    pub fn run_loop(&mut self, board: &mut Board) {
        let deadline = board
            .next_event_deadline()
            .unwrap_or(board.timing.time + LOOP_QUANTUM);
        if self.halted {
            // Events still fire while halted; nothing else consumes time.
            board.timing.time = board.timing.time.max(deadline);
        } else {
            while board.timing.time < deadline {
                self.step_one(board);
            }
        }
        board.process_events();
        if board.take_halt_request() {
            self.halted = true;
        }
    }

    /// Single-step one instruction, servicing any event that came due.
    pub fn step(&mut self, board: &mut Board) {
        if self.halted {
            if let Some(deadline) = board.next_event_deadline() {
                board.timing.time = board.timing.time.max(deadline);
            }
        } else {
            self.step_one(board);
        }
        board.process_events();
        if board.take_halt_request() {
            self.halted = true;
        }
    }

    fn step_one(&mut self, board: &mut Board) {
        let pc = self.gprs[15].wrapping_sub(self.instruction_width() * 2) as u32;
        if board.idle_optimization == IdleOptimization::Remove
            && board.idle_loop != crate::overrides::IDLE_LOOP_NONE
            && pc == board.idle_loop
        {
            // Known idle loop; fast-forward to the next event.
            if let Some(deadline) = board.next_event_deadline() {
                board.timing.time = board.timing.time.max(deadline);
                return;
            }
        }
        self.gprs[15] = self.gprs[15].wrapping_add(self.instruction_width());
        board.timing.time += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pc_write_realigns_per_execution_state() {
        let mut cpu = Cpu::new();
        cpu.write_pc(0x0800_0003);
        assert_eq!(cpu.gprs[15], 0x0800_0004);
        cpu.cpsr |= CPSR_T;
        cpu.write_pc(0x0800_0003);
        assert_eq!(cpu.gprs[15], 0x0800_0004);
        cpu.write_pc(0x0800_0001);
        assert_eq!(cpu.gprs[15], 0x0800_0002);
    }

    #[test]
    fn idle_loop_skip_respects_the_policy() {
        let mut board = Board::new();
        board.video.schedule(0);
        board.idle_loop = 0x0800_0000;
        let mut cpu = Cpu::new();
        // ARM state reads the executing pc back as gprs[15] - 8.
        cpu.gprs[15] = 0x0800_0008;

        board.idle_optimization = IdleOptimization::Ignore;
        cpu.step(&mut board);
        assert_eq!(board.timing.time, 1);

        board.idle_optimization = IdleOptimization::Remove;
        cpu.gprs[15] = 0x0800_0008;
        cpu.step(&mut board);
        assert_eq!(board.timing.time, VIDEO_HORIZONTAL_LENGTH as u64);
    }

    #[test]
    fn component_slots_hold_and_release() {
        let mut cpu = Cpu::new();
        assert!(cpu.component(CPU_COMPONENT_CHEAT_DEVICE).is_none());
        cpu.attach_component(
            CPU_COMPONENT_CHEAT_DEVICE,
            CpuComponent::Cheats(CheatDevice::new()),
        );
        assert!(cpu.component(CPU_COMPONENT_CHEAT_DEVICE).is_some());
        assert!(cpu.detach_component(CPU_COMPONENT_CHEAT_DEVICE).is_some());
        assert!(cpu.component(CPU_COMPONENT_CHEAT_DEVICE).is_none());
    }
}
