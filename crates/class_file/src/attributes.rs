use std::fmt;

use log::debug;

use crate::{constant_pool::ConstantValue, parser::Parser, AccessFlags, ConstantPool, Result};

macro_rules! attribute_kinds {
    ($($kind:ident),* $(,)?) => {
        /// Every attribute name predefined by the class file format.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum AttributeKind {
            $($kind,)*
        }
        impl AttributeKind {
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($kind) => Some(AttributeKind::$kind),)*
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(AttributeKind::$kind => stringify!($kind),)*
                }
            }
        }
    };
}

attribute_kinds! {
    ConstantValue,
    Code,
    StackMapTable,
    Exceptions,
    InnerClasses,
    EnclosingMethod,
    Synthetic,
    Signature,
    SourceFile,
    SourceDebugExtension,
    LineNumberTable,
    LocalVariableTable,
    LocalVariableTypeTable,
    Deprecated,
    RuntimeVisibleAnnotations,
    RuntimeInvisibleAnnotations,
    RuntimeVisibleParameterAnnotations,
    RuntimeInvisibleParameterAnnotations,
    RuntimeVisibleTypeAnnotations,
    RuntimeInvisibleTypeAnnotations,
    AnnotationDefault,
    BootstrapMethods,
    MethodParameters,
    Module,
    ModulePackages,
    ModuleMainClass,
    NestHost,
    NestMembers,
    Record,
    PermittedSubclasses,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An attribute as it appears in the class file: a name and an uninterpreted payload.
#[derive(Clone, PartialEq)]
pub struct AttributeInfo {
    pub attribute_name_index: u16,
    pub attribute_length: u32,
    pub info: Vec<u8>,
}
impl AttributeInfo {
    pub fn name<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.attribute_name_index)
    }

    pub fn kind(&self, constant_pool: &ConstantPool) -> Option<AttributeKind> {
        AttributeKind::from_name(self.name(constant_pool)?)
    }

    /// Reinterprets the payload according to the attribute's name.
    ///
    /// Attributes with an unknown name, or whose shape is not decoded, come back
    /// as [`Attribute::Opaque`]. A payload too short for its shape is an error.
    pub fn upgrade(&self, constant_pool: &ConstantPool) -> Result<Attribute> {
        let Some(kind) = self.kind(constant_pool) else {
            debug!(
                "Keeping unknown attribute {:?} opaque",
                self.name(constant_pool)
            );
            return Ok(Attribute::Opaque(self.clone()));
        };

        Ok(Parser::for_attribute(&self.info, kind)
            .parse_attribute_body(kind)?
            .unwrap_or_else(|| Attribute::Opaque(self.clone())))
    }
}
impl fmt::Debug for AttributeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeInfo")
            .field("attribute_name_index", &self.attribute_name_index)
            .field("info", &format!("({} bytes)", self.info.len()))
            .finish()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Attributes(pub Vec<AttributeInfo>);
impl Attributes {
    pub fn iter(&self) -> std::slice::Iter<'_, AttributeInfo> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn find_by_name(&self, name: &str, constant_pool: &ConstantPool) -> Option<&AttributeInfo> {
        self.0.iter().find(|a| a.name(constant_pool) == Some(name))
    }

    pub fn find_by_kind(
        &self,
        kind: AttributeKind,
        constant_pool: &ConstantPool,
    ) -> Option<&AttributeInfo> {
        self.find_by_name(kind.name(), constant_pool)
    }

    /// Upgrades the first attribute of the given kind, if there is one.
    pub fn upgrade(
        &self,
        kind: AttributeKind,
        constant_pool: &ConstantPool,
    ) -> Result<Option<Attribute>> {
        self.find_by_kind(kind, constant_pool)
            .map(|a| a.upgrade(constant_pool))
            .transpose()
    }

    pub fn code_attribute(&self, constant_pool: &ConstantPool) -> Result<Option<CodeAttribute>> {
        Ok(match self.upgrade(AttributeKind::Code, constant_pool)? {
            Some(Attribute::Code(code)) => Some(code),
            _ => None,
        })
    }

    /// The generic signature, treating a malformed Signature attribute as absent.
    pub fn signature<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        match self.upgrade(AttributeKind::Signature, constant_pool).ok()?? {
            Attribute::Signature(signature) => signature.signature(constant_pool),
            _ => None,
        }
    }

    pub fn source_file<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        match self.upgrade(AttributeKind::SourceFile, constant_pool).ok()?? {
            Attribute::SourceFile(source_file) => source_file.source_file(constant_pool),
            _ => None,
        }
    }
}
impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a AttributeInfo;
    type IntoIter = std::slice::Iter<'a, AttributeInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// An attribute with its payload decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    ConstantValue(ConstantValueAttribute),
    Code(CodeAttribute),
    SourceFile(SourceFileAttribute),
    InnerClasses(InnerClassesAttribute),
    Signature(SignatureAttribute),
    MethodParameters(MethodParametersAttribute),
    Exceptions(ClassesAttribute),
    LineNumberTable(LineNumberTableAttribute),
    LocalVariableTable(LocalVariableTableAttribute),
    LocalVariableTypeTable(LocalVariableTableAttribute),
    EnclosingMethod(EnclosingMethodAttribute),
    BootstrapMethods(BootstrapMethodsAttribute),
    NestHost(NestHostAttribute),
    NestMembers(ClassesAttribute),
    PermittedSubclasses(ClassesAttribute),
    Synthetic,
    Deprecated,
    Opaque(AttributeInfo),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantValueAttribute {
    pub constantvalue_index: u16,
}
impl ConstantValueAttribute {
    pub fn value<'p>(&self, constant_pool: &'p ConstantPool) -> Option<ConstantValue<'p>> {
        constant_pool.constant_value(self.constantvalue_index)
    }
}

/// A protected code range `[start_pc, end_pc)` and its handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}
impl ExceptionTableEntry {
    pub fn is_catch_all(&self) -> bool {
        self.catch_type == 0
    }

    pub fn catch_type_name<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.class_name(self.catch_type)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Attributes,
}
impl CodeAttribute {
    pub fn line_number_table(
        &self,
        constant_pool: &ConstantPool,
    ) -> Result<Option<LineNumberTableAttribute>> {
        Ok(
            match self
                .attributes
                .upgrade(AttributeKind::LineNumberTable, constant_pool)?
            {
                Some(Attribute::LineNumberTable(table)) => Some(table),
                _ => None,
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFileAttribute {
    pub sourcefile_index: u16,
}
impl SourceFileAttribute {
    pub fn source_file<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.sourcefile_index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InnerClass {
    pub inner_class_info_index: u16,
    /// 0 for top-level, local and anonymous classes.
    pub outer_class_info_index: u16,
    /// 0 for anonymous classes.
    pub inner_name_index: u16,
    pub inner_class_access_flags: AccessFlags,
}
impl InnerClass {
    pub fn inner_class_name<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.class_name(self.inner_class_info_index)
    }

    pub fn outer_class_name<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.class_name(self.outer_class_info_index)
    }

    pub fn inner_name<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.inner_name_index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InnerClassesAttribute {
    pub classes: Vec<InnerClass>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignatureAttribute {
    pub signature_index: u16,
}
impl SignatureAttribute {
    pub fn signature<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.signature_index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodParameter {
    /// 0 when the parameter has no name.
    pub name_index: u16,
    pub access_flags: AccessFlags,
}
impl MethodParameter {
    pub fn name<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.name_index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodParametersAttribute {
    pub parameters: Vec<MethodParameter>,
}

/// A list of class constants: Exceptions, NestMembers and PermittedSubclasses.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassesAttribute {
    pub classes: Vec<u16>,
}
impl ClassesAttribute {
    pub fn class_names<'a, 'p: 'a>(
        &'a self,
        constant_pool: &'p ConstantPool,
    ) -> impl Iterator<Item = Option<&'p str>> + 'a {
        self.classes.iter().map(|&i| constant_pool.class_name(i))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineNumber {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineNumberTableAttribute {
    pub line_number_table: Vec<LineNumber>,
}
impl LineNumberTableAttribute {
    /// The source line of the instruction at `pc`.
    pub fn line_for(&self, pc: u16) -> Option<u16> {
        self.line_number_table
            .iter()
            .filter(|l| l.start_pc <= pc)
            .max_by_key(|l| l.start_pc)
            .map(|l| l.line_number)
    }
}

/// A row of LocalVariableTable, or of LocalVariableTypeTable where
/// `descriptor_index` refers to a field signature instead.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}
impl LocalVariable {
    pub fn name<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.name_index)
    }

    pub fn descriptor<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.descriptor_index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalVariableTableAttribute {
    pub local_variable_table: Vec<LocalVariable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnclosingMethodAttribute {
    pub class_index: u16,
    /// 0 when the class is not immediately enclosed by a method or constructor.
    pub method_index: u16,
}
impl EnclosingMethodAttribute {
    pub fn class_name<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.class_name(self.class_index)
    }

    pub fn method<'p>(&self, constant_pool: &'p ConstantPool) -> Option<(&'p str, &'p str)> {
        constant_pool.name_and_type(self.method_index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapMethod {
    pub bootstrap_method_ref: u16,
    pub bootstrap_arguments: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapMethodsAttribute {
    pub bootstrap_methods: Vec<BootstrapMethod>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NestHostAttribute {
    pub host_class_index: u16,
}
impl NestHostAttribute {
    pub fn host_class_name<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.class_name(self.host_class_index)
    }
}
