use log::{debug, trace};

use crate::{
    attributes::{
        Attribute, AttributeKind, Attributes, BootstrapMethod, BootstrapMethodsAttribute,
        ClassesAttribute, CodeAttribute, ConstantValueAttribute, EnclosingMethodAttribute,
        ExceptionTableEntry, InnerClass, InnerClassesAttribute, LineNumber,
        LineNumberTableAttribute, LocalVariable, LocalVariableTableAttribute, MethodParameter,
        MethodParametersAttribute, NestHostAttribute, SignatureAttribute, SourceFileAttribute,
    },
    class_file::{FieldInfo, MethodInfo},
    constant_pool::{
        ClassInfo, ConstantTag, CpInfo, DoubleInfo, DynamicInfo, FloatInfo, IntegerInfo,
        LongInfo, MethodHandleInfo, MethodTypeInfo, ModuleInfo, NameAndTypeInfo, PackageInfo,
        RefInfo, StringInfo, Utf8Info,
    },
    error::Stage,
    reader::Reader,
    AccessFlags, AttributeInfo, ClassFile, ClassFileError, ConstantPool, Result,
};

/// Decodes a class file in a single forward pass over a byte buffer.
pub struct Parser<'a> {
    r: Reader<'a>,
}
impl<'a> Parser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            r: Reader::new(buf),
        }
    }

    pub(crate) fn for_attribute(info: &'a [u8], kind: AttributeKind) -> Self {
        Self {
            r: Reader::with_stage(info, Stage::AttributeBody(kind)),
        }
    }

    pub fn parse(&mut self) -> Result<ClassFile> {
        self.r.enter(Stage::Header);
        let magic = self.r.read_u32()?;
        let (major_version, minor_version) = self.parse_version()?;
        debug!(
            "Class file magic 0x{:X}, version {}.{}",
            magic, major_version, minor_version
        );

        self.r.enter(Stage::ConstantPool);
        let constant_pool = self.parse_constant_pool()?;

        self.r.enter(Stage::ClassInfo);
        let access_flags = AccessFlags::from_bits_truncate(self.r.read_u16()?);
        let this_class = self.r.read_u16()?;
        let super_class = self.r.read_u16()?;

        self.r.enter(Stage::Interfaces);
        let interfaces_count = self.r.read_u16()?;
        let interfaces = self.r.read_u16_vec(interfaces_count as usize)?;

        self.r.enter(Stage::Fields);
        let fields_count = self.r.read_u16()?;
        let fields = (0..fields_count)
            .map(|_| self.parse_field_info())
            .collect::<Result<Vec<_>>>()?;

        self.r.enter(Stage::Methods);
        let methods_count = self.r.read_u16()?;
        let methods = (0..methods_count)
            .map(|_| self.parse_method_info())
            .collect::<Result<Vec<_>>>()?;

        self.r.enter(Stage::Attributes);
        let attributes_count = self.r.read_u16()?;
        let attributes = self.parse_attributes(attributes_count)?;

        debug!(
            "Decoded {} interfaces, {} fields, {} methods, {} attributes",
            interfaces.len(),
            fields.len(),
            methods.len(),
            attributes.len()
        );
        if self.r.remaining() > 0 {
            debug!("Ignoring {} trailing bytes", self.r.remaining());
        }

        Ok(ClassFile {
            magic,
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    fn parse_field_info(&mut self) -> Result<FieldInfo> {
        let access_flags = AccessFlags::from_bits_truncate(self.r.read_u16()?);
        let name_index = self.r.read_u16()?;
        let descriptor_index = self.r.read_u16()?;
        let attributes_count = self.r.read_u16()?;
        let attributes = self.parse_attributes(attributes_count)?;

        Ok(FieldInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    fn parse_method_info(&mut self) -> Result<MethodInfo> {
        let access_flags = AccessFlags::from_bits_truncate(self.r.read_u16()?);
        let name_index = self.r.read_u16()?;
        let descriptor_index = self.r.read_u16()?;
        let attributes_count = self.r.read_u16()?;
        let attributes = self.parse_attributes(attributes_count)?;

        Ok(MethodInfo {
            access_flags,
            name_index,
            descriptor_index,
            attributes,
        })
    }

    fn parse_version(&mut self) -> Result<(u16, u16)> {
        let minor = self.r.read_u16()?;
        let major = self.r.read_u16()?;
        Ok((major, minor))
    }

    fn parse_constant_pool(&mut self) -> Result<ConstantPool> {
        let constant_pool_count = self.r.read_u16()?;
        debug!("Constant pool count {}", constant_pool_count);

        let mut cp_infos = vec![CpInfo::Unusable; constant_pool_count as usize];
        // Long and Double entries take two slots, so the index may step past the last one.
        let mut index = 1u32;
        while index < constant_pool_count as u32 {
            let (cp_info, slots) = self.parse_cp_info(index as u16)?;
            trace!("#{} = {:?}", index, cp_info);

            cp_infos[index as usize] = cp_info;
            index += slots as u32;
        }

        Ok(ConstantPool::new(cp_infos))
    }

    fn parse_cp_info(&mut self, index: u16) -> Result<(CpInfo, u16)> {
        let offset = self.r.position();
        let tag = ConstantTag::try_from(self.r.read_u8()?)
            .map_err(|tag| ClassFileError::InvalidCpInfoTag { tag, index, offset })?;

        let cp_info = match tag {
            ConstantTag::Utf8 => self.parse_utf8()?,
            ConstantTag::Integer => self.parse_integer()?,
            ConstantTag::Float => self.parse_float()?,
            ConstantTag::Long => self.parse_long()?,
            ConstantTag::Double => self.parse_double()?,
            ConstantTag::Class => self.parse_class_info()?,
            ConstantTag::String => self.parse_string()?,
            ConstantTag::FieldRef => CpInfo::FieldRef(self.parse_ref_info()?),
            ConstantTag::MethodRef => CpInfo::MethodRef(self.parse_ref_info()?),
            ConstantTag::InterfaceMethodRef => CpInfo::InterfaceMethodRef(self.parse_ref_info()?),
            ConstantTag::NameAndType => self.parse_name_and_type_info()?,
            ConstantTag::MethodHandle => self.parse_method_handle()?,
            ConstantTag::MethodType => self.parse_method_type_info()?,
            ConstantTag::Dynamic => CpInfo::Dynamic(self.parse_dynamic_info()?),
            ConstantTag::InvokeDynamic => CpInfo::InvokeDynamic(self.parse_dynamic_info()?),
            ConstantTag::Module => self.parse_module_info()?,
            ConstantTag::Package => self.parse_package_info()?,
        };

        Ok((cp_info, tag.slots()))
    }

    fn parse_utf8(&mut self) -> Result<CpInfo> {
        let length = self.r.read_u16()?;
        let bytes = self.r.read_bytes(length as usize)?;

        Ok(CpInfo::Utf8(Utf8Info::new(bytes.to_vec())))
    }

    fn parse_integer(&mut self) -> Result<CpInfo> {
        let bytes = self.r.read_array()?;

        Ok(CpInfo::Integer(IntegerInfo { bytes }))
    }

    fn parse_float(&mut self) -> Result<CpInfo> {
        let bytes = self.r.read_array()?;

        Ok(CpInfo::Float(FloatInfo::new(bytes)))
    }

    fn parse_long(&mut self) -> Result<CpInfo> {
        let high_bytes = self.r.read_array()?;
        let low_bytes = self.r.read_array()?;

        Ok(CpInfo::Long(LongInfo {
            high_bytes,
            low_bytes,
        }))
    }

    fn parse_double(&mut self) -> Result<CpInfo> {
        let high_bytes = self.r.read_array()?;
        let low_bytes = self.r.read_array()?;

        Ok(CpInfo::Double(DoubleInfo::new(high_bytes, low_bytes)))
    }

    fn parse_class_info(&mut self) -> Result<CpInfo> {
        let name_index = self.r.read_u16()?;

        Ok(CpInfo::Class(ClassInfo { name_index }))
    }

    fn parse_string(&mut self) -> Result<CpInfo> {
        let string_index = self.r.read_u16()?;

        Ok(CpInfo::String(StringInfo { string_index }))
    }

    fn parse_name_and_type_info(&mut self) -> Result<CpInfo> {
        let name_index = self.r.read_u16()?;
        let descriptor_index = self.r.read_u16()?;

        Ok(CpInfo::NameAndType(NameAndTypeInfo {
            name_index,
            descriptor_index,
        }))
    }

    fn parse_method_handle(&mut self) -> Result<CpInfo> {
        let reference_kind = self.r.read_u8()?;
        let reference_index = self.r.read_u16()?;

        Ok(CpInfo::MethodHandle(MethodHandleInfo {
            reference_kind,
            reference_index,
        }))
    }

    fn parse_method_type_info(&mut self) -> Result<CpInfo> {
        let descriptor_index = self.r.read_u16()?;

        Ok(CpInfo::MethodType(MethodTypeInfo { descriptor_index }))
    }

    fn parse_dynamic_info(&mut self) -> Result<DynamicInfo> {
        let bootstrap_method_attr_index = self.r.read_u16()?;
        let name_and_type_index = self.r.read_u16()?;

        Ok(DynamicInfo {
            bootstrap_method_attr_index,
            name_and_type_index,
        })
    }

    fn parse_module_info(&mut self) -> Result<CpInfo> {
        let name_index = self.r.read_u16()?;

        Ok(CpInfo::Module(ModuleInfo { name_index }))
    }

    fn parse_package_info(&mut self) -> Result<CpInfo> {
        let name_index = self.r.read_u16()?;

        Ok(CpInfo::Package(PackageInfo { name_index }))
    }

    fn parse_ref_info(&mut self) -> Result<RefInfo> {
        let class_index = self.r.read_u16()?;
        let name_and_type_index = self.r.read_u16()?;

        Ok(RefInfo {
            class_index,
            name_and_type_index,
        })
    }

    fn parse_attribute(&mut self) -> Result<AttributeInfo> {
        let attribute_name_index = self.r.read_u16()?;
        let attribute_length = self.r.read_u32()?;
        let info = self.r.read_bytes(attribute_length as usize)?.to_vec();

        Ok(AttributeInfo {
            attribute_name_index,
            attribute_length,
            info,
        })
    }

    fn parse_attributes(&mut self, attributes_count: u16) -> Result<Attributes> {
        (0..attributes_count)
            .map(|_| self.parse_attribute())
            .collect::<Result<Vec<_>>>()
            .map(Attributes)
    }

    /// Decodes an attribute payload of the given kind.
    ///
    /// Returns `None` for kinds whose payload stays opaque.
    pub(crate) fn parse_attribute_body(
        &mut self,
        kind: AttributeKind,
    ) -> Result<Option<Attribute>> {
        trace!("Upgrading {} attribute", kind);

        let attribute = match kind {
            AttributeKind::ConstantValue => Attribute::ConstantValue(ConstantValueAttribute {
                constantvalue_index: self.r.read_u16()?,
            }),
            AttributeKind::Code => Attribute::Code(self.parse_code_attribute()?),
            AttributeKind::SourceFile => Attribute::SourceFile(SourceFileAttribute {
                sourcefile_index: self.r.read_u16()?,
            }),
            AttributeKind::InnerClasses => {
                Attribute::InnerClasses(self.parse_inner_classes_attribute()?)
            }
            AttributeKind::Signature => Attribute::Signature(SignatureAttribute {
                signature_index: self.r.read_u16()?,
            }),
            AttributeKind::MethodParameters => {
                Attribute::MethodParameters(self.parse_method_parameters_attribute()?)
            }
            AttributeKind::Exceptions => Attribute::Exceptions(self.parse_classes_attribute()?),
            AttributeKind::LineNumberTable => {
                Attribute::LineNumberTable(self.parse_line_number_table_attribute()?)
            }
            AttributeKind::LocalVariableTable => {
                Attribute::LocalVariableTable(self.parse_local_variable_table_attribute()?)
            }
            AttributeKind::LocalVariableTypeTable => {
                Attribute::LocalVariableTypeTable(self.parse_local_variable_table_attribute()?)
            }
            AttributeKind::EnclosingMethod => Attribute::EnclosingMethod(EnclosingMethodAttribute {
                class_index: self.r.read_u16()?,
                method_index: self.r.read_u16()?,
            }),
            AttributeKind::BootstrapMethods => {
                Attribute::BootstrapMethods(self.parse_bootstrap_methods_attribute()?)
            }
            AttributeKind::NestHost => Attribute::NestHost(NestHostAttribute {
                host_class_index: self.r.read_u16()?,
            }),
            AttributeKind::NestMembers => Attribute::NestMembers(self.parse_classes_attribute()?),
            AttributeKind::PermittedSubclasses => {
                Attribute::PermittedSubclasses(self.parse_classes_attribute()?)
            }
            AttributeKind::Synthetic => Attribute::Synthetic,
            AttributeKind::Deprecated => Attribute::Deprecated,
            _ => return Ok(None),
        };

        if self.r.remaining() > 0 {
            debug!(
                "{} attribute has {} trailing bytes",
                kind,
                self.r.remaining()
            );
        }

        Ok(Some(attribute))
    }

    pub fn parse_code_attribute(&mut self) -> Result<CodeAttribute> {
        let max_stack = self.r.read_u16()?;
        let max_locals = self.r.read_u16()?;
        let code_length = self.r.read_u32()?;
        let code = self.r.read_bytes(code_length as usize)?.to_vec();
        let exception_table_length = self.r.read_u16()?;
        let exception_table = (0..exception_table_length)
            .map(|_| self.parse_exception_table_entry())
            .collect::<Result<Vec<_>>>()?;
        let attributes_count = self.r.read_u16()?;
        let attributes = self.parse_attributes(attributes_count)?;

        Ok(CodeAttribute {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }

    fn parse_exception_table_entry(&mut self) -> Result<ExceptionTableEntry> {
        let start_pc = self.r.read_u16()?;
        let end_pc = self.r.read_u16()?;
        let handler_pc = self.r.read_u16()?;
        let catch_type = self.r.read_u16()?;

        Ok(ExceptionTableEntry {
            start_pc,
            end_pc,
            handler_pc,
            catch_type,
        })
    }

    fn parse_inner_classes_attribute(&mut self) -> Result<InnerClassesAttribute> {
        let number_of_classes = self.r.read_u16()?;
        let classes = (0..number_of_classes)
            .map(|_| self.parse_inner_class())
            .collect::<Result<Vec<_>>>()?;

        Ok(InnerClassesAttribute { classes })
    }

    fn parse_inner_class(&mut self) -> Result<InnerClass> {
        let inner_class_info_index = self.r.read_u16()?;
        let outer_class_info_index = self.r.read_u16()?;
        let inner_name_index = self.r.read_u16()?;
        let inner_class_access_flags = AccessFlags::from_bits_truncate(self.r.read_u16()?);

        Ok(InnerClass {
            inner_class_info_index,
            outer_class_info_index,
            inner_name_index,
            inner_class_access_flags,
        })
    }

    fn parse_method_parameters_attribute(&mut self) -> Result<MethodParametersAttribute> {
        // Unlike every other table, the parameter count is a single byte.
        let parameters_count = self.r.read_u8()?;
        let parameters = (0..parameters_count)
            .map(|_| self.parse_method_parameter())
            .collect::<Result<Vec<_>>>()?;

        Ok(MethodParametersAttribute { parameters })
    }

    fn parse_method_parameter(&mut self) -> Result<MethodParameter> {
        let name_index = self.r.read_u16()?;
        let access_flags = AccessFlags::from_bits_truncate(self.r.read_u16()?);

        Ok(MethodParameter {
            name_index,
            access_flags,
        })
    }

    fn parse_classes_attribute(&mut self) -> Result<ClassesAttribute> {
        let number_of_classes = self.r.read_u16()?;
        let classes = self.r.read_u16_vec(number_of_classes as usize)?;

        Ok(ClassesAttribute { classes })
    }

    fn parse_line_number_table_attribute(&mut self) -> Result<LineNumberTableAttribute> {
        let line_number_table_length = self.r.read_u16()?;
        let line_number_table = (0..line_number_table_length)
            .map(|_| -> Result<LineNumber> {
                Ok(LineNumber {
                    start_pc: self.r.read_u16()?,
                    line_number: self.r.read_u16()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(LineNumberTableAttribute { line_number_table })
    }

    fn parse_local_variable_table_attribute(&mut self) -> Result<LocalVariableTableAttribute> {
        let local_variable_table_length = self.r.read_u16()?;
        let local_variable_table = (0..local_variable_table_length)
            .map(|_| -> Result<LocalVariable> {
                Ok(LocalVariable {
                    start_pc: self.r.read_u16()?,
                    length: self.r.read_u16()?,
                    name_index: self.r.read_u16()?,
                    descriptor_index: self.r.read_u16()?,
                    index: self.r.read_u16()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(LocalVariableTableAttribute {
            local_variable_table,
        })
    }

    fn parse_bootstrap_methods_attribute(&mut self) -> Result<BootstrapMethodsAttribute> {
        let num_bootstrap_methods = self.r.read_u16()?;
        let bootstrap_methods = (0..num_bootstrap_methods)
            .map(|_| -> Result<BootstrapMethod> {
                let bootstrap_method_ref = self.r.read_u16()?;
                let num_bootstrap_arguments = self.r.read_u16()?;
                let bootstrap_arguments = self.r.read_u16_vec(num_bootstrap_arguments as usize)?;

                Ok(BootstrapMethod {
                    bootstrap_method_ref,
                    bootstrap_arguments,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BootstrapMethodsAttribute { bootstrap_methods })
    }
}
