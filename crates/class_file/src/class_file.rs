use std::io::Read;

use crate::{
    attributes::{Attribute, AttributeKind, Attributes, CodeAttribute, InnerClassesAttribute},
    constant_pool::ConstantValue,
    parser::Parser,
    AccessFlags, ClassFileError, ConstantPool, Result,
};

pub const MAGIC_IDENTIFIER: u32 = 0xCAFEBABE;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub magic: u32,
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: AccessFlags,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Attributes,
}
impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<ClassFile> {
        Parser::new(bytes).parse()
    }

    /// Reads the whole stream and decodes it.
    pub fn read(mut r: impl Read) -> Result<ClassFile> {
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes)?;
        Self::parse(&bytes)
    }

    /// Decoding never rejects the magic identifier; callers check it here.
    pub fn check_magic(&self) -> Result<()> {
        match self.magic {
            MAGIC_IDENTIFIER => Ok(()),
            magic_identifier => Err(ClassFileError::InvalidMagicIdentifier(magic_identifier)),
        }
    }

    /// `(major, minor)`
    pub fn version(&self) -> (u16, u16) {
        (self.major_version, self.minor_version)
    }

    pub fn class_name(&self) -> Option<&str> {
        // The constant_pool entry at this_class must be a CONSTANT_Class_info structure
        // representing the class or interface defined by this class file.
        self.constant_pool.class_name(self.this_class)
    }

    /// `None` for java/lang/Object, the only class without a direct superclass.
    pub fn super_class(&self) -> Option<&str> {
        // FIXME: For an interface, super_class must always be a valid index referring to
        //        the class Object; this is not checked.
        if self.super_class == 0 {
            return None;
        }

        self.constant_pool.class_name(self.super_class)
    }

    /// Direct superinterfaces in declaration order; `None` where an index does not resolve.
    pub fn interface_names(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.interfaces
            .iter()
            .map(|&i| self.constant_pool.class_name(i))
    }

    pub fn source_file(&self) -> Option<&str> {
        self.attributes.source_file(&self.constant_pool)
    }

    pub fn signature(&self) -> Option<&str> {
        self.attributes.signature(&self.constant_pool)
    }

    pub fn inner_classes(&self) -> Result<Option<InnerClassesAttribute>> {
        Ok(
            match self
                .attributes
                .upgrade(AttributeKind::InnerClasses, &self.constant_pool)?
            {
                Some(Attribute::InnerClasses(inner_classes)) => Some(inner_classes),
                _ => None,
            },
        )
    }

    pub fn field_name(&self, field: &FieldInfo) -> Option<&str> {
        field.name(&self.constant_pool)
    }

    pub fn field_descriptor(&self, field: &FieldInfo) -> Option<&str> {
        field.descriptor(&self.constant_pool)
    }

    pub fn method_name(&self, method: &MethodInfo) -> Option<&str> {
        method.name(&self.constant_pool)
    }

    pub fn method_descriptor(&self, method: &MethodInfo) -> Option<&str> {
        method.descriptor(&self.constant_pool)
    }

    pub fn find_field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields
            .iter()
            .find(|f| f.name(&self.constant_pool) == Some(name))
    }

    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| {
            m.name(&self.constant_pool) == Some(name)
                && m.descriptor(&self.constant_pool) == Some(descriptor)
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub access_flags: AccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Attributes,
}
impl FieldInfo {
    pub fn name<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.name_index)
    }

    pub fn descriptor<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.descriptor_index)
    }

    pub fn signature<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        self.attributes.signature(constant_pool)
    }

    /// The initial value of a static field, from its ConstantValue attribute.
    pub fn constant_value<'p>(&self, constant_pool: &'p ConstantPool) -> Option<ConstantValue<'p>> {
        match self
            .attributes
            .upgrade(AttributeKind::ConstantValue, constant_pool)
            .ok()??
        {
            Attribute::ConstantValue(constant_value) => constant_value.value(constant_pool),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub access_flags: AccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Attributes,
}
impl MethodInfo {
    pub fn name<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.name_index)
    }

    pub fn descriptor<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.descriptor_index)
    }

    pub fn signature<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        self.attributes.signature(constant_pool)
    }

    /// `None` for abstract and native methods.
    pub fn code(&self, constant_pool: &ConstantPool) -> Result<Option<CodeAttribute>> {
        self.attributes.code_attribute(constant_pool)
    }

    /// Formal parameter names from the MethodParameters attribute, `None` for
    /// parameters recorded without a name.
    pub fn parameter_names<'p>(
        &self,
        constant_pool: &'p ConstantPool,
    ) -> Result<Option<Vec<Option<&'p str>>>> {
        Ok(
            match self
                .attributes
                .upgrade(AttributeKind::MethodParameters, constant_pool)?
            {
                Some(Attribute::MethodParameters(parameters)) => Some(
                    parameters
                        .parameters
                        .iter()
                        .map(|p| p.name(constant_pool))
                        .collect(),
                ),
                _ => None,
            },
        )
    }

    /// Class names listed in the method's `throws` clause.
    pub fn exception_names<'p>(
        &self,
        constant_pool: &'p ConstantPool,
    ) -> Result<Vec<Option<&'p str>>> {
        Ok(
            match self
                .attributes
                .upgrade(AttributeKind::Exceptions, constant_pool)?
            {
                Some(Attribute::Exceptions(exceptions)) => {
                    exceptions.class_names(constant_pool).collect()
                }
                _ => Vec::new(),
            },
        )
    }
}
