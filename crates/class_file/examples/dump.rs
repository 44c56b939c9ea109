use std::{env, fs::File};

use decaf_class_file::{AttributeKind, ClassFile};
use memmap::Mmap;

fn main() {
    pretty_env_logger::init();

    let Some(path) = env::args().nth(1) else {
        eprintln!("usage: dump <path/to/Some.class>");
        return;
    };
    let file = File::open(&path).unwrap();
    let mmap = unsafe { Mmap::map(&file).unwrap() };

    let class_file = decaf_class_file::decode(&mmap).unwrap();
    if let Err(err) = class_file.check_magic() {
        log::warn!("{}: {}", path, err);
    }

    print_header(&class_file);

    println!();
    println!("Fields:");
    for field in &class_file.fields {
        println!(
            "    {:?} {} {}",
            field.access_flags,
            or_unknown(class_file.field_name(field)),
            or_unknown(class_file.field_descriptor(field))
        );
    }

    let pool = &class_file.constant_pool;
    println!();
    println!("Methods:");
    for method in &class_file.methods {
        println!(
            "    {:?} {}{}",
            method.access_flags,
            or_unknown(class_file.method_name(method)),
            or_unknown(class_file.method_descriptor(method))
        );
        match method.code(pool) {
            Ok(Some(code)) => println!(
                "        code: {} bytes, max_stack {}, max_locals {}",
                code.code.len(),
                code.max_stack,
                code.max_locals
            ),
            Ok(None) => {}
            Err(err) => log::warn!("Bad Code attribute: {}", err),
        }
    }

    println!();
    println!("Attributes:");
    for attribute in &class_file.attributes {
        match attribute.kind(pool) {
            Some(AttributeKind::SourceFile) => {
                println!("    SourceFile {}", or_unknown(class_file.source_file()))
            }
            Some(kind) => println!("    {} ({} bytes)", kind, attribute.attribute_length),
            None => println!(
                "    {} ({} bytes, opaque)",
                or_unknown(attribute.name(pool)),
                attribute.attribute_length
            ),
        }
    }
}

fn print_header(class_file: &ClassFile) {
    let (major, minor) = class_file.version();
    println!("Version: {}.{}", major, minor);
    println!("Constant pool: {} slots", class_file.constant_pool.count());
    println!(
        "{:?} {}",
        class_file.access_flags,
        or_unknown(class_file.class_name())
    );
    if let Some(super_class) = class_file.super_class() {
        println!("    extends {}", super_class);
    }
    for interface in class_file.interface_names() {
        println!("    implements {}", or_unknown(interface));
    }
}

fn or_unknown(s: Option<&str>) -> &str {
    s.unwrap_or("<unresolved>")
}
