// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.3
// Author: Lukas Bower
// Date Modified: 2026-10-17

//! Fault IPC decoding and reporting.
//!
//! The kernel delivers a fault as an IPC whose label identifies the fault
//! kind and whose message registers carry its payload. [`Fault::decode`]
//! turns such a message into a typed value; [`format_fault_message`]
//! renders it as a single diagnostic line. A message that does not match
//! any known layout decodes to [`Fault::Unknown`] and is still reported.

mod reporter;

pub use reporter::{
    fault_reporter_entry, install_fault_runtime, start_fault_handler, FaultReporter, FaultRuntime,
};

use crate::arch::Arch;
use crate::diagnostics::{capture, DiagnosticLevel, DiagnosticSink};
use crate::sel4::IpcMessage;
use crate::types::Word;

pub const FAULT_LABEL_NULL: Word = 0;
pub const FAULT_LABEL_CAP: Word = 1;
pub const FAULT_LABEL_UNKNOWN_SYSCALL: Word = 2;
pub const FAULT_LABEL_USER_EXCEPTION: Word = 3;
pub const FAULT_LABEL_DEBUG_EXCEPTION: Word = 4;
pub const FAULT_LABEL_VMFAULT: Word = 5;
pub const FAULT_LABEL_TIMEOUT: Word = 9;

pub const VM_FAULT_IP: usize = 0;
pub const VM_FAULT_ADDR: usize = 1;
pub const VM_FAULT_PREFETCH: usize = 2;
pub const VM_FAULT_FSR: usize = 3;
pub const VM_FAULT_LENGTH: usize = 4;

pub const CAP_FAULT_IP: usize = 0;
pub const CAP_FAULT_ADDR: usize = 1;
const CAP_FAULT_MIN_LENGTH: usize = 2;

pub const TIMEOUT_DATA: usize = 0;
pub const TIMEOUT_CONSUMED: usize = 1;
const TIMEOUT_MIN_LENGTH: usize = 1;

/// A decoded fault message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    VmFault {
        read: bool,
        prefetch: bool,
        ip: Word,
        addr: Word,
        fsr: Word,
    },
    UnknownSyscall {
        syscall: Word,
        ip: Word,
    },
    UserException {
        ip: Word,
        number: Word,
        code: Word,
    },
    CapFault {
        ip: Word,
        addr: Word,
    },
    /// Budget expiry delivered to a temporal fault endpoint.
    Timeout {
        data: Word,
        consumed: Word,
    },
    /// Label not recognised, or payload length not matching the label.
    Unknown {
        label: Word,
        length: usize,
    },
}

impl Fault {
    /// Decode `message` using the message-register layout of `arch`.
    pub fn decode(arch: Arch, message: &IpcMessage) -> Fault {
        let label = message.info.label();
        let length = message.info.length() as usize;
        let layout = arch.fault_layout();

        match label {
            FAULT_LABEL_VMFAULT if length == VM_FAULT_LENGTH => {
                let fsr = message.mr(VM_FAULT_FSR);
                Fault::VmFault {
                    read: arch.is_read_fault(fsr),
                    prefetch: message.mr(VM_FAULT_PREFETCH) != 0,
                    ip: message.mr(VM_FAULT_IP),
                    addr: message.mr(VM_FAULT_ADDR),
                    fsr,
                }
            }
            FAULT_LABEL_UNKNOWN_SYSCALL if length == layout.unknown_syscall_length => Fault::UnknownSyscall {
                syscall: message.mr(layout.unknown_syscall_number),
                ip: message.mr(layout.unknown_syscall_ip),
            },
            FAULT_LABEL_USER_EXCEPTION if length == layout.user_exception_length => Fault::UserException {
                ip: message.mr(layout.user_exception_ip),
                number: message.mr(layout.user_exception_number),
                code: message.mr(layout.user_exception_number + 1),
            },
            FAULT_LABEL_CAP if length >= CAP_FAULT_MIN_LENGTH => Fault::CapFault {
                ip: message.mr(CAP_FAULT_IP),
                addr: message.mr(CAP_FAULT_ADDR),
            },
            FAULT_LABEL_TIMEOUT if length >= TIMEOUT_MIN_LENGTH => Fault::Timeout {
                data: message.mr(TIMEOUT_DATA),
                consumed: message.mr(TIMEOUT_CONSUMED),
            },
            _ => Fault::Unknown { label, length },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Fault::VmFault { .. } => "vmfault",
            Fault::UnknownSyscall { .. } => "unknown-syscall",
            Fault::UserException { .. } => "user-exception",
            Fault::CapFault { .. } => "cap",
            Fault::Timeout { .. } => "timeout",
            Fault::Unknown { .. } => "unknown",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Fault::Unknown { .. })
    }
}

/// Render `fault` as one diagnostic line attributed to `thread_name`.
pub fn format_fault_message(fault: &Fault, thread_name: &str) -> String {
    match *fault {
        Fault::VmFault {
            read,
            prefetch,
            ip,
            addr,
            ..
        } => format!(
            "Pagefault from [{thread_name}]: {} {} at PC: 0x{ip:x} vaddr: 0x{addr:x}",
            if read { "read" } else { "write" },
            if prefetch { "prefetch fault" } else { "fault" },
        ),
        Fault::UnknownSyscall { syscall, ip } => {
            format!("Bad syscall from [{thread_name}]: scno {syscall} at PC: 0x{ip:x}")
        }
        Fault::UserException { ip, .. } => {
            format!("Invalid instruction from [{thread_name}] at PC: 0x{ip:x}")
        }
        Fault::CapFault { ip, addr } => {
            format!("Capability fault from [{thread_name}]: cptr 0x{addr:x} at PC: 0x{ip:x}")
        }
        Fault::Timeout { data, consumed } => {
            format!("Timeout fault from [{thread_name}]: data 0x{data:x} consumed {consumed}")
        }
        Fault::Unknown { label, length } => {
            format!("Unknown fault from [{thread_name}]: {label} (length = {length})")
        }
    }
}

/// Decode `message` and emit the resulting line on `sink`.
pub fn print_fault_message(
    sink: &dyn DiagnosticSink,
    arch: Arch,
    message: &IpcMessage,
    thread_name: &str,
) -> Fault {
    let fault = Fault::decode(arch, message);
    let severity = if fault.is_unknown() {
        DiagnosticLevel::Warning
    } else {
        DiagnosticLevel::Error
    };
    capture(sink, "fault", format_fault_message(&fault, thread_name), severity);
    fault
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::x86_64::PageFaultCode;
    use crate::types::MessageInfo;

    fn message(label: Word, mrs: &[Word]) -> IpcMessage {
        IpcMessage {
            info: MessageInfo::new(label, 0, 0, mrs.len() as Word),
            badge: 0,
            mrs: mrs.to_vec(),
        }
    }

    #[test]
    fn x86_write_fault_is_decoded() {
        let fsr = (PageFaultCode::WRITE | PageFaultCode::USER).bits();
        let fault = Fault::decode(Arch::X86_64, &message(FAULT_LABEL_VMFAULT, &[0xc0de, 0xbad, 0, fsr]));
        assert_eq!(
            fault,
            Fault::VmFault {
                read: false,
                prefetch: false,
                ip: 0xc0de,
                addr: 0xbad,
                fsr
            }
        );
    }

    #[test]
    fn arm_prefetch_read_fault() {
        let fault = Fault::decode(Arch::Arm, &message(FAULT_LABEL_VMFAULT, &[0x400, 0x400, 1, 0]));
        let line = format_fault_message(&fault, "app");
        assert_eq!(line, "Pagefault from [app]: read prefetch fault at PC: 0x400 vaddr: 0x400");
    }

    #[test]
    fn unknown_syscall_uses_arch_layout() {
        let mut mrs = [0 as Word; 13];
        mrs[8] = 0x1234;
        mrs[12] = 42;
        let fault = Fault::decode(Arch::Aarch64, &message(FAULT_LABEL_UNKNOWN_SYSCALL, &mrs));
        assert_eq!(format_fault_message(&fault, "t"), "Bad syscall from [t]: scno 42 at PC: 0x1234");
    }

    #[test]
    fn user_exception_reports_instruction_pointer() {
        let fault = Fault::decode(Arch::Ia32, &message(FAULT_LABEL_USER_EXCEPTION, &[0x8000, 0, 0, 6, 0]));
        assert_eq!(format_fault_message(&fault, "t"), "Invalid instruction from [t] at PC: 0x8000");
    }

    #[test]
    fn wrong_length_falls_back_to_unknown() {
        let fault = Fault::decode(Arch::X86_64, &message(FAULT_LABEL_VMFAULT, &[1, 2]));
        assert_eq!(fault, Fault::Unknown { label: FAULT_LABEL_VMFAULT, length: 2 });
        assert_eq!(format_fault_message(&fault, "t"), "Unknown fault from [t]: 5 (length = 2)");
    }

    #[test]
    fn cap_and_timeout_faults() {
        let cap = Fault::decode(Arch::Aarch64, &message(FAULT_LABEL_CAP, &[0x10, 0x22, 0, 0]));
        assert_eq!(cap, Fault::CapFault { ip: 0x10, addr: 0x22 });
        let timeout = Fault::decode(Arch::Aarch64, &message(FAULT_LABEL_TIMEOUT, &[7, 500]));
        assert_eq!(
            format_fault_message(&timeout, "rt"),
            "Timeout fault from [rt]: data 0x7 consumed 500"
        );
    }
}
