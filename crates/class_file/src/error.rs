use std::fmt;

use thiserror::Error;

use crate::attributes::AttributeKind;

/// The part of the class file being read when a decode failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Header,
    ConstantPool,
    ClassInfo,
    Interfaces,
    Fields,
    Methods,
    Attributes,
    /// Upgrading an attribute payload. Offsets reported in this stage are
    /// relative to the start of the payload, not the class file.
    AttributeBody(AttributeKind),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Header => f.write_str("header"),
            Stage::ConstantPool => f.write_str("constant pool"),
            Stage::ClassInfo => f.write_str("class info"),
            Stage::Interfaces => f.write_str("interfaces"),
            Stage::Fields => f.write_str("fields"),
            Stage::Methods => f.write_str("methods"),
            Stage::Attributes => f.write_str("attributes"),
            Stage::AttributeBody(kind) => write!(f, "{} attribute payload", kind),
        }
    }
}

#[derive(Error, Debug)]
pub enum ClassFileError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("Out of data in {stage} at offset {offset}, {remaining} of {wanted} bytes left")]
    UnexpectedEof {
        stage: Stage,
        /// Payload-relative under [`Stage::AttributeBody`], absolute otherwise.
        offset: usize,
        wanted: usize,
        remaining: usize,
    },
    #[error("Invalid cp info tag {tag} for constant pool index {index} at offset {offset}")]
    InvalidCpInfoTag { tag: u8, index: u16, offset: usize },
    #[error("Invalid magic identifier: 0x{0:X}")]
    InvalidMagicIdentifier(u32),
}
