#![allow(dead_code)]

use byteorder::{BigEndian, WriteBytesExt};

type Endian = BigEndian;

pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

/// Appends constant pool entries and hands out their indices.
pub struct ConstantPoolBuilder {
    bytes: Vec<u8>,
    next_index: u16,
}
impl ConstantPoolBuilder {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            next_index: 1,
        }
    }

    /// The `constant_pool_count` for the entries added so far.
    pub fn count(&self) -> u16 {
        self.next_index
    }

    pub fn raw(&mut self, tag: u8, payload: &[u8], slots: u16) -> u16 {
        self.bytes.write_u8(tag).unwrap();
        self.bytes.extend_from_slice(payload);

        let index = self.next_index;
        self.next_index += slots;
        index
    }

    pub fn utf8_bytes(&mut self, bytes: &[u8]) -> u16 {
        let mut payload = Vec::new();
        payload.write_u16::<Endian>(bytes.len() as u16).unwrap();
        payload.extend_from_slice(bytes);
        self.raw(1, &payload, 1)
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        self.utf8_bytes(s.as_bytes())
    }

    pub fn integer(&mut self, value: i32) -> u16 {
        self.raw(3, &value.to_be_bytes(), 1)
    }

    pub fn float_bits(&mut self, bits: u32) -> u16 {
        self.raw(4, &bits.to_be_bytes(), 1)
    }

    pub fn long(&mut self, value: i64) -> u16 {
        self.raw(5, &value.to_be_bytes(), 2)
    }

    pub fn double_bits(&mut self, bits: u64) -> u16 {
        self.raw(6, &bits.to_be_bytes(), 2)
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        self.raw(7, &name_index.to_be_bytes(), 1)
    }

    pub fn string(&mut self, s: &str) -> u16 {
        let string_index = self.utf8(s);
        self.raw(8, &string_index.to_be_bytes(), 1)
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        self.raw(12, &u16s(&[name_index, descriptor_index]), 1)
    }

    pub fn method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(class);
        let name_and_type_index = self.name_and_type(name, descriptor);
        self.raw(10, &u16s(&[class_index, name_and_type_index]), 1)
    }

    /// A complete attribute record named `name`.
    pub fn attribute(&mut self, name: &str, info: &[u8]) -> Vec<u8> {
        let name_index = self.utf8(name);
        let mut bytes = Vec::new();
        bytes.write_u16::<Endian>(name_index).unwrap();
        bytes.write_u32::<Endian>(info.len() as u32).unwrap();
        bytes.extend_from_slice(info);
        bytes
    }
}

pub fn u16s(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

struct Member {
    access_flags: u16,
    name_index: u16,
    descriptor_index: u16,
    attributes: Vec<Vec<u8>>,
}

/// Assembles a class file image field by field.
pub struct ClassBuilder {
    pub pool: ConstantPoolBuilder,
    pub magic: u32,
    pub access_flags: u16,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<Member>,
    methods: Vec<Member>,
    attributes: Vec<Vec<u8>>,
}
impl ClassBuilder {
    pub fn new(name: &str, super_name: Option<&str>) -> Self {
        let mut pool = ConstantPoolBuilder::new();
        let this_class = pool.class(name);
        let super_class = super_name.map_or(0, |s| pool.class(s));

        Self {
            pool,
            magic: 0xCAFEBABE,
            access_flags: 0x0021,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn interface(&mut self, name: &str) -> &mut Self {
        let index = self.pool.class(name);
        self.interfaces.push(index);
        self
    }

    pub fn field(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        attributes: Vec<Vec<u8>>,
    ) -> &mut Self {
        let member = self.member(access_flags, name, descriptor, attributes);
        self.fields.push(member);
        self
    }

    pub fn method(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        attributes: Vec<Vec<u8>>,
    ) -> &mut Self {
        let member = self.member(access_flags, name, descriptor, attributes);
        self.methods.push(member);
        self
    }

    pub fn attribute(&mut self, attribute: Vec<u8>) -> &mut Self {
        self.attributes.push(attribute);
        self
    }

    fn member(
        &mut self,
        access_flags: u16,
        name: &str,
        descriptor: &str,
        attributes: Vec<Vec<u8>>,
    ) -> Member {
        Member {
            access_flags,
            name_index: self.pool.utf8(name),
            descriptor_index: self.pool.utf8(descriptor),
            attributes,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.write_u32::<Endian>(self.magic).unwrap();
        bytes.write_u16::<Endian>(0).unwrap();
        bytes.write_u16::<Endian>(61).unwrap();

        bytes.write_u16::<Endian>(self.pool.count()).unwrap();
        bytes.extend_from_slice(&self.pool.bytes);

        bytes.write_u16::<Endian>(self.access_flags).unwrap();
        bytes.write_u16::<Endian>(self.this_class).unwrap();
        bytes.write_u16::<Endian>(self.super_class).unwrap();
        bytes.write_u16::<Endian>(self.interfaces.len() as u16).unwrap();
        bytes.extend(u16s(&self.interfaces));

        for members in [&self.fields, &self.methods] {
            bytes.write_u16::<Endian>(members.len() as u16).unwrap();
            for member in members {
                bytes.write_u16::<Endian>(member.access_flags).unwrap();
                bytes.write_u16::<Endian>(member.name_index).unwrap();
                bytes.write_u16::<Endian>(member.descriptor_index).unwrap();
                write_attributes(&mut bytes, &member.attributes);
            }
        }

        write_attributes(&mut bytes, &self.attributes);
        bytes
    }
}

fn write_attributes(bytes: &mut Vec<u8>, attributes: &[Vec<u8>]) {
    bytes.write_u16::<Endian>(attributes.len() as u16).unwrap();
    for attribute in attributes {
        bytes.extend_from_slice(attribute);
    }
}

/// The payload of a Code attribute.
pub fn code(
    max_stack: u16,
    max_locals: u16,
    code: &[u8],
    exception_table: &[[u16; 4]],
    attributes: &[Vec<u8>],
) -> Vec<u8> {
    let mut bytes = u16s(&[max_stack, max_locals]);
    bytes.write_u32::<Endian>(code.len() as u32).unwrap();
    bytes.extend_from_slice(code);
    bytes.write_u16::<Endian>(exception_table.len() as u16).unwrap();
    for entry in exception_table {
        bytes.extend(u16s(entry));
    }
    write_attributes(&mut bytes, attributes);
    bytes
}

/// A class with one field, one method and a SourceFile attribute.
pub fn minimal_class() -> Vec<u8> {
    let mut class = ClassBuilder::new("Minimal", Some("java/lang/Object"));
    class.field(0x0002, "count", "I", vec![]);
    class.method(0x0401, "run", "()V", vec![]);
    let source_file = class.pool.utf8("Minimal.java");
    let attribute = class.pool.attribute("SourceFile", &source_file.to_be_bytes());
    class.attribute(attribute);
    class.build()
}
