use std::{fmt, ops::Index, sync::OnceLock};

use crate::{mutf8, numeric};

/// Borrows the payload of the entry at `$index` if it is a `CpInfo::$i`.
#[macro_export]
macro_rules! matches_cp_info {
    ($cp:expr, $index:expr, $i:ident) => {
        match &$cp[$index] {
            $crate::constant_pool::CpInfo::$i(ref n) => Some(n),
            _ => None,
        }
    };
}

static UNUSABLE: CpInfo = CpInfo::Unusable;

/// The constant pool of a class file, indexed from 1.
///
/// Slot 0 and the slot following every Long and Double entry hold
/// [`CpInfo::Unusable`], as does any index past the end of the pool.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConstantPool {
    cp_infos: Vec<CpInfo>,
}
impl ConstantPool {
    /// `cp_infos[0]` must be [`CpInfo::Unusable`]; its length is the pool count.
    pub fn new(cp_infos: Vec<CpInfo>) -> Self {
        Self { cp_infos }
    }

    /// The `constant_pool_count` this pool was decoded from.
    pub fn count(&self) -> u16 {
        self.cp_infos.len() as u16
    }

    pub fn get(&self, index: u16) -> &CpInfo {
        self.cp_infos.get(index as usize).unwrap_or(&UNUSABLE)
    }

    /// Populated entries with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &CpInfo)> {
        self.cp_infos
            .iter()
            .enumerate()
            .filter(|(_, cp_info)| !cp_info.is_unusable())
            .map(|(index, cp_info)| (index as u16, cp_info))
    }

    pub fn utf8(&self, index: u16) -> Option<&str> {
        matches_cp_info!(self, index, Utf8).map(Utf8Info::as_str)
    }

    pub fn class_name(&self, index: u16) -> Option<&str> {
        matches_cp_info!(self, index, Class)?.name(self)
    }

    pub fn module_name(&self, index: u16) -> Option<&str> {
        matches_cp_info!(self, index, Module)?.name(self)
    }

    pub fn package_name(&self, index: u16) -> Option<&str> {
        matches_cp_info!(self, index, Package)?.name(self)
    }

    pub fn string(&self, index: u16) -> Option<&str> {
        matches_cp_info!(self, index, String)?.value(self)
    }

    /// Name and descriptor of a CONSTANT_NameAndType_info.
    pub fn name_and_type(&self, index: u16) -> Option<(&str, &str)> {
        let name_and_type = matches_cp_info!(self, index, NameAndType)?;
        Some((name_and_type.name(self)?, name_and_type.descriptor(self)?))
    }

    /// Resolves a Fieldref, Methodref or InterfaceMethodref.
    pub fn member_ref(&self, index: u16) -> Option<MemberRef<'_>> {
        match self.get(index) {
            CpInfo::FieldRef(r) | CpInfo::MethodRef(r) | CpInfo::InterfaceMethodRef(r) => {
                r.resolve(self)
            }
            _ => None,
        }
    }

    /// The loadable value of an Integer, Float, Long, Double or String entry.
    pub fn constant_value(&self, index: u16) -> Option<ConstantValue<'_>> {
        match self.get(index) {
            CpInfo::Integer(i) => Some(ConstantValue::Int(i.value())),
            CpInfo::Float(f) => Some(ConstantValue::Float(f.value())),
            CpInfo::Long(l) => Some(ConstantValue::Long(l.value())),
            CpInfo::Double(d) => Some(ConstantValue::Double(d.value())),
            CpInfo::String(s) => s.value(self).map(ConstantValue::String),
            _ => None,
        }
    }
}
impl Index<u16> for ConstantPool {
    type Output = CpInfo;

    fn index(&self, index: u16) -> &Self::Output {
        self.get(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstantTag {
    Utf8 = 1,
    Integer = 3,
    Float = 4,
    Long = 5,
    Double = 6,
    Class = 7,
    String = 8,
    FieldRef = 9,
    MethodRef = 10,
    InterfaceMethodRef = 11,
    NameAndType = 12,
    MethodHandle = 15,
    MethodType = 16,
    Dynamic = 17,
    InvokeDynamic = 18,
    Module = 19,
    Package = 20,
}
impl ConstantTag {
    /// Number of pool slots an entry of this kind occupies.
    pub fn slots(self) -> u16 {
        match self {
            ConstantTag::Long | ConstantTag::Double => 2,
            _ => 1,
        }
    }
}
impl TryFrom<u8> for ConstantTag {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Ok(match value {
            1 => ConstantTag::Utf8,
            3 => ConstantTag::Integer,
            4 => ConstantTag::Float,
            5 => ConstantTag::Long,
            6 => ConstantTag::Double,
            7 => ConstantTag::Class,
            8 => ConstantTag::String,
            9 => ConstantTag::FieldRef,
            10 => ConstantTag::MethodRef,
            11 => ConstantTag::InterfaceMethodRef,
            12 => ConstantTag::NameAndType,
            15 => ConstantTag::MethodHandle,
            16 => ConstantTag::MethodType,
            17 => ConstantTag::Dynamic,
            18 => ConstantTag::InvokeDynamic,
            19 => ConstantTag::Module,
            20 => ConstantTag::Package,
            _ => return Err(value),
        })
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum CpInfo {
    Class(ClassInfo),
    FieldRef(RefInfo),
    MethodRef(RefInfo),
    InterfaceMethodRef(RefInfo),
    String(StringInfo),
    Integer(IntegerInfo),
    Float(FloatInfo),
    Long(LongInfo),
    Double(DoubleInfo),
    NameAndType(NameAndTypeInfo),
    Utf8(Utf8Info),
    MethodHandle(MethodHandleInfo),
    MethodType(MethodTypeInfo),
    Dynamic(DynamicInfo),
    InvokeDynamic(DynamicInfo),
    Module(ModuleInfo),
    Package(PackageInfo),
    Unusable,
}
impl CpInfo {
    /// The tag this entry was read with, `None` for [`CpInfo::Unusable`].
    pub fn tag(&self) -> Option<ConstantTag> {
        Some(match self {
            CpInfo::Class(_) => ConstantTag::Class,
            CpInfo::FieldRef(_) => ConstantTag::FieldRef,
            CpInfo::MethodRef(_) => ConstantTag::MethodRef,
            CpInfo::InterfaceMethodRef(_) => ConstantTag::InterfaceMethodRef,
            CpInfo::String(_) => ConstantTag::String,
            CpInfo::Integer(_) => ConstantTag::Integer,
            CpInfo::Float(_) => ConstantTag::Float,
            CpInfo::Long(_) => ConstantTag::Long,
            CpInfo::Double(_) => ConstantTag::Double,
            CpInfo::NameAndType(_) => ConstantTag::NameAndType,
            CpInfo::Utf8(_) => ConstantTag::Utf8,
            CpInfo::MethodHandle(_) => ConstantTag::MethodHandle,
            CpInfo::MethodType(_) => ConstantTag::MethodType,
            CpInfo::Dynamic(_) => ConstantTag::Dynamic,
            CpInfo::InvokeDynamic(_) => ConstantTag::InvokeDynamic,
            CpInfo::Module(_) => ConstantTag::Module,
            CpInfo::Package(_) => ConstantTag::Package,
            CpInfo::Unusable => return None,
        })
    }

    pub fn is_unusable(&self) -> bool {
        matches!(self, CpInfo::Unusable)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassInfo {
    // The value of the name_index item must be a valid index into the constant_pool table.
    // The constant_pool entry at that index must be a CONSTANT_Utf8_info structure
    // representing a valid binary class or interface name encoded in internal form.
    pub name_index: u16,
}
impl ClassInfo {
    pub fn name<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.name_index)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct RefInfo {
    pub class_index: u16,
    pub name_and_type_index: u16,
}
impl RefInfo {
    pub fn resolve<'p>(&self, constant_pool: &'p ConstantPool) -> Option<MemberRef<'p>> {
        let (name, descriptor) = constant_pool.name_and_type(self.name_and_type_index)?;

        Some(MemberRef {
            class_name: constant_pool.class_name(self.class_index)?,
            name,
            descriptor,
        })
    }
}

/// A fully resolved field or method reference.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MemberRef<'p> {
    pub class_name: &'p str,
    pub name: &'p str,
    pub descriptor: &'p str,
}

#[derive(Debug, PartialEq, Clone)]
pub struct StringInfo {
    pub string_index: u16,
}
impl StringInfo {
    pub fn value<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.string_index)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct IntegerInfo {
    pub bytes: [u8; 4],
}
impl IntegerInfo {
    pub fn value(&self) -> i32 {
        i32::from_be_bytes(self.bytes)
    }
}

#[derive(Clone)]
pub struct FloatInfo {
    pub bytes: [u8; 4],
    value: OnceLock<f32>,
}
impl FloatInfo {
    pub fn new(bytes: [u8; 4]) -> Self {
        Self {
            bytes,
            value: OnceLock::new(),
        }
    }

    pub fn bits(&self) -> u32 {
        u32::from_be_bytes(self.bytes)
    }

    pub fn value(&self) -> f32 {
        *self
            .value
            .get_or_init(|| numeric::float_from_bits(self.bits()))
    }
}
impl PartialEq for FloatInfo {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}
impl fmt::Debug for FloatInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloatInfo")
            .field("bits", &format_args!("0x{:08x}", self.bits()))
            .finish()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct LongInfo {
    pub high_bytes: [u8; 4],
    pub low_bytes: [u8; 4],
}
impl LongInfo {
    pub fn value(&self) -> i64 {
        numeric::long_from_halves(
            u32::from_be_bytes(self.high_bytes),
            u32::from_be_bytes(self.low_bytes),
        )
    }
}

#[derive(Clone)]
pub struct DoubleInfo {
    pub high_bytes: [u8; 4],
    pub low_bytes: [u8; 4],
    value: OnceLock<f64>,
}
impl DoubleInfo {
    pub fn new(high_bytes: [u8; 4], low_bytes: [u8; 4]) -> Self {
        Self {
            high_bytes,
            low_bytes,
            value: OnceLock::new(),
        }
    }

    pub fn bits(&self) -> u64 {
        numeric::join_halves(
            u32::from_be_bytes(self.high_bytes),
            u32::from_be_bytes(self.low_bytes),
        )
    }

    pub fn value(&self) -> f64 {
        *self
            .value
            .get_or_init(|| numeric::double_from_bits(self.bits()))
    }
}
impl PartialEq for DoubleInfo {
    fn eq(&self, other: &Self) -> bool {
        self.high_bytes == other.high_bytes && self.low_bytes == other.low_bytes
    }
}
impl fmt::Debug for DoubleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoubleInfo")
            .field("bits", &format_args!("0x{:016x}", self.bits()))
            .finish()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct NameAndTypeInfo {
    pub name_index: u16,
    pub descriptor_index: u16,
}
impl NameAndTypeInfo {
    pub fn name<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.name_index)
    }

    pub fn descriptor<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.descriptor_index)
    }
}

/// Raw modified UTF-8 bytes, decoded to a `String` on first access.
#[derive(Clone)]
pub struct Utf8Info {
    bytes: Vec<u8>,
    text: OnceLock<String>,
}
impl Utf8Info {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            text: OnceLock::new(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_str(&self) -> &str {
        self.text.get_or_init(|| mutf8::decode(&self.bytes))
    }
}
impl PartialEq for Utf8Info {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}
impl fmt::Debug for Utf8Info {
    // Must not force the decode; the parser traces every entry.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text.get() {
            Some(text) => f.debug_tuple("Utf8Info").field(text).finish(),
            None => f
                .debug_struct("Utf8Info")
                .field("length", &self.bytes.len())
                .finish(),
        }
    }
}

/// The `reference_kind` of a CONSTANT_MethodHandle_info.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    GetField = 1,
    GetStatic = 2,
    PutField = 3,
    PutStatic = 4,
    InvokeVirtual = 5,
    InvokeStatic = 6,
    InvokeSpecial = 7,
    NewInvokeSpecial = 8,
    InvokeInterface = 9,
}
impl TryFrom<u8> for ReferenceKind {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Ok(match value {
            1 => ReferenceKind::GetField,
            2 => ReferenceKind::GetStatic,
            3 => ReferenceKind::PutField,
            4 => ReferenceKind::PutStatic,
            5 => ReferenceKind::InvokeVirtual,
            6 => ReferenceKind::InvokeStatic,
            7 => ReferenceKind::InvokeSpecial,
            8 => ReferenceKind::NewInvokeSpecial,
            9 => ReferenceKind::InvokeInterface,
            _ => return Err(value),
        })
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodHandleInfo {
    pub reference_kind: u8,
    pub reference_index: u16,
}
impl MethodHandleInfo {
    pub fn kind(&self) -> Option<ReferenceKind> {
        ReferenceKind::try_from(self.reference_kind).ok()
    }

    pub fn reference<'p>(&self, constant_pool: &'p ConstantPool) -> Option<MemberRef<'p>> {
        constant_pool.member_ref(self.reference_index)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodTypeInfo {
    pub descriptor_index: u16,
}
impl MethodTypeInfo {
    pub fn descriptor<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.descriptor_index)
    }
}

/// Payload shared by CONSTANT_Dynamic_info and CONSTANT_InvokeDynamic_info.
#[derive(Debug, PartialEq, Clone)]
pub struct DynamicInfo {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}
impl DynamicInfo {
    pub fn name_and_type<'p>(&self, constant_pool: &'p ConstantPool) -> Option<(&'p str, &'p str)> {
        constant_pool.name_and_type(self.name_and_type_index)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ModuleInfo {
    pub name_index: u16,
}
impl ModuleInfo {
    pub fn name<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.name_index)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct PackageInfo {
    pub name_index: u16,
}
impl PackageInfo {
    pub fn name<'p>(&self, constant_pool: &'p ConstantPool) -> Option<&'p str> {
        constant_pool.utf8(self.name_index)
    }
}

/// A loadable constant as referenced by a ConstantValue attribute or `ldc`.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ConstantValue<'p> {
    Int(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(&'p str),
}
