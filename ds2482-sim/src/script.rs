use std::{fmt, str::FromStr};

use ds2482_emu::{Dispatch, I2cTarget};

/// One I2C transaction issued by the simulated master.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Write transaction carrying these bytes.
    Write(Vec<u8>),
    /// Read transaction of this many bytes.
    Read(usize),
}

impl FromStr for Op {
    type Err = String;

    /// `w:e1,f0` writes two bytes, `w:` is an address-only write,
    /// `r` reads one byte and `r:3` reads three.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, arg) = s.split_once(':').unwrap_or((s, ""));
        match kind {
            "w" | "W" => arg
                .split(',')
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(parse_byte)
                .collect::<Result<Vec<_>, _>>()
                .map(Op::Write),
            "r" | "R" if arg.is_empty() => Ok(Op::Read(1)),
            "r" | "R" => arg
                .parse()
                .map(Op::Read)
                .map_err(|e| format!("invalid read count {arg:?}: {e}")),
            _ => Err(format!("unknown operation {s:?}, expected w:<bytes> or r[:count]")),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Write(bytes) => write!(f, "write {bytes:02X?}"),
            Op::Read(count) => write!(f, "read {count}"),
        }
    }
}

/// Parse a byte written as hex, with or without a `0x` prefix.
pub fn parse_byte(s: &str) -> Result<u8, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(digits, 16).map_err(|e| format!("invalid byte {s:?}: {e}"))
}

/// Simulated I2C master driving a target through a transaction script.
pub struct Master {
    addr: u8,
    max_polls: usize,
}

impl Master {
    /// Master addressing transactions to `addr`. After each write it
    /// lets the target process at most `max_polls` ticks.
    pub fn new(addr: u8, max_polls: usize) -> Self {
        Self { addr, max_polls }
    }

    /// Run `ops` against `target`, returning every byte read.
    pub fn run<T: I2cTarget>(&self, target: &mut T, ops: &[Op]) -> Vec<u8> {
        let mut read = Vec::new();
        if target.address() != self.addr {
            log::warn!(
                "no target at {:#04x} (bridge answers at {:#04x}), all transactions NAKed",
                self.addr,
                target.address()
            );
            return read;
        }
        for op in ops {
            log::debug!("{}", op);
            match op {
                Op::Write(bytes) => {
                    target.on_receive(bytes);
                    self.settle(target);
                }
                Op::Read(count) => {
                    for _ in 0..*count {
                        let byte = target.on_request();
                        log::info!("read {:#04x}", byte);
                        read.push(byte);
                    }
                }
            }
        }
        read
    }

    fn settle<T: I2cTarget>(&self, target: &mut T) {
        for _ in 0..self.max_polls {
            match target.poll() {
                Ok(Dispatch::Waiting(command)) => {
                    log::debug!("{} waiting for parameters", command.name())
                }
                Ok(Dispatch::Executed(command)) => log::info!("executed {}", command.name()),
                Ok(Dispatch::Idle) => return,
                Err(e) => log::warn!("command rejected: {:?}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ds2482_emu::Bridge;

    #[test]
    fn parse_operations() {
        assert_eq!("w:e1,f0".parse::<Op>(), Ok(Op::Write(vec![0xe1, 0xf0])));
        assert_eq!("w:0xC3, 0x02".parse::<Op>(), Ok(Op::Write(vec![0xc3, 0x02])));
        assert_eq!("w:".parse::<Op>(), Ok(Op::Write(vec![])));
        assert_eq!("r".parse::<Op>(), Ok(Op::Read(1)));
        assert_eq!("r:3".parse::<Op>(), Ok(Op::Read(3)));
        assert!("w:1ff".parse::<Op>().is_err());
        assert!("x:00".parse::<Op>().is_err());
        assert!("r:many".parse::<Op>().is_err());
    }

    #[test]
    fn reset_and_read_twice() {
        let mut bridge = Bridge::<16>::new();
        let ops = [Op::Write(vec![0xf0]), Op::Read(2)];
        assert_eq!(Master::new(0x18, 4).run(&mut bridge, &ops), vec![0x18, 0x08]);
    }

    #[test]
    fn channel_select_and_pointer() {
        let mut bridge = Bridge::<16>::new();
        let ops = [
            Op::Write(vec![0xc3, 0x02]),
            Op::Write(vec![0xe1, 0xf0]),
            Op::Write(vec![]),
            Op::Read(1),
        ];
        assert_eq!(Master::new(0x18, 4).run(&mut bridge, &ops), vec![0x08]);
        assert_eq!(bridge.registers().channel(), 0x02);
    }

    #[test]
    fn wrong_address_is_nacked() {
        let mut bridge = Bridge::<16>::new();
        let ops = [Op::Write(vec![0xc3, 0x02]), Op::Read(1)];
        assert!(Master::new(0x19, 4).run(&mut bridge, &ops).is_empty());
        assert_eq!(bridge.registers().channel(), 0);
    }
}
