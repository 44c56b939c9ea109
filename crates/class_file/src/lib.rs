// https://docs.oracle.com/javase/specs/jvms/se19/html/jvms-4.html

mod access_flags;
#[macro_use]
pub mod constant_pool;
pub mod attributes;
mod class_file;
mod error;
mod mutf8;
mod numeric;
mod parser;
mod reader;

pub use self::class_file::{ClassFile, FieldInfo, MethodInfo, MAGIC_IDENTIFIER};
pub use access_flags::AccessFlags;
pub use attributes::{Attribute, AttributeInfo, AttributeKind, Attributes};
pub use constant_pool::{ConstantPool, CpInfo};
pub use error::{ClassFileError, Stage};
pub use parser::Parser;
pub use reader::Reader;

pub type Result<T, E = ClassFileError> = std::result::Result<T, E>;

/// Decodes a complete class file image.
pub fn decode(buf: &[u8]) -> Result<ClassFile> {
    Parser::new(buf).parse()
}
