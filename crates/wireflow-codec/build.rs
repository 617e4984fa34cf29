//! Compiles `proto/processor.proto` into Rust types and gRPC stubs.
//!
//! When `protoc` is installed it is used directly. Otherwise the build
//! falls back to an in-code `FileDescriptorSet` that mirrors
//! `proto/processor.proto` field-for-field, so the crate still builds
//! in environments without the protobuf compiler. Keep the two in sync
//! if the proto changes.

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MethodDescriptorProto, OneofDescriptorProto, ServiceDescriptorProto,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/processor.proto");
    if protoc_available() {
        tonic_build::compile_protos("proto/processor.proto")?;
    } else {
        tonic_build::compile_fds(descriptor_set())?;
    }
    Ok(())
}

fn protoc_available() -> bool {
    if std::env::var_os("PROTOC").is_some() {
        return true;
    }
    std::process::Command::new("protoc")
        .arg("--version")
        .output()
        .is_ok()
}

fn field(
    name: &str,
    number: i32,
    ty: Type,
    label: Label,
    type_name: Option<&str>,
    oneof_index: Option<i32>,
) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_owned()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(ty as i32),
        type_name: type_name.map(str::to_owned),
        oneof_index,
        ..Default::default()
    }
}

fn oneof(name: &str) -> OneofDescriptorProto {
    OneofDescriptorProto {
        name: Some(name.to_owned()),
        ..Default::default()
    }
}

fn message(
    name: &str,
    fields: Vec<FieldDescriptorProto>,
    oneofs: Vec<OneofDescriptorProto>,
) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_owned()),
        field: fields,
        oneof_decl: oneofs,
        ..Default::default()
    }
}

fn method(
    name: &str,
    input: &str,
    output: &str,
    client_streaming: bool,
    server_streaming: bool,
) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_owned()),
        input_type: Some(input.to_owned()),
        output_type: Some(output.to_owned()),
        client_streaming: Some(client_streaming),
        server_streaming: Some(server_streaming),
        ..Default::default()
    }
}

fn descriptor_set() -> FileDescriptorSet {
    const PKG: &str = ".wireflow.processor";
    let generic = message(
        "Generic",
        vec![
            field("bool", 1, Type::Bool, Label::Optional, None, Some(0)),
            field("bytes", 2, Type::Bytes, Label::Optional, None, Some(0)),
            field("double", 3, Type::Double, Label::Optional, None, Some(0)),
            field("float", 4, Type::Float, Label::Optional, None, Some(0)),
            field("int", 5, Type::Int32, Label::Optional, None, Some(0)),
            field("long", 6, Type::Int64, Label::Optional, None, Some(0)),
            field("string", 7, Type::String, Label::Optional, None, Some(0)),
        ],
        vec![oneof("kind")],
    );
    let string_list = message(
        "StringList",
        vec![field("values", 1, Type::String, Label::Repeated, None, None)],
        vec![],
    );
    let header_value = message(
        "HeaderValue",
        vec![
            field(
                "generic",
                1,
                Type::Message,
                Label::Optional,
                Some(&format!("{PKG}.Generic")),
                Some(0),
            ),
            field(
                "list",
                2,
                Type::Message,
                Label::Optional,
                Some(&format!("{PKG}.StringList")),
                Some(0),
            ),
        ],
        vec![oneof("value")],
    );
    let header_entry = message(
        "HeaderEntry",
        vec![
            field("key", 1, Type::String, Label::Optional, None, None),
            field(
                "value",
                2,
                Type::Message,
                Label::Optional,
                Some(&format!("{PKG}.HeaderValue")),
                None,
            ),
        ],
        vec![],
    );
    let envelope = message(
        "Envelope",
        vec![
            field("payload", 1, Type::Bytes, Label::Optional, None, None),
            field(
                "headers",
                2,
                Type::Message,
                Label::Repeated,
                Some(&format!("{PKG}.HeaderEntry")),
                None,
            ),
        ],
        vec![],
    );
    let ping_request = message("PingRequest", vec![], vec![]);
    let status = message(
        "Status",
        vec![field("message", 1, Type::String, Label::Optional, None, None)],
        vec![],
    );

    let envelope_ty = format!("{PKG}.Envelope");
    let processor = ServiceDescriptorProto {
        name: Some("Processor".to_owned()),
        method: vec![
            method("Process", &envelope_ty, &envelope_ty, false, false),
            method("Stream", &envelope_ty, &envelope_ty, true, true),
            method(
                "Ping",
                &format!("{PKG}.PingRequest"),
                &format!("{PKG}.Status"),
                false,
                false,
            ),
        ],
        ..Default::default()
    };

    FileDescriptorSet {
        file: vec![FileDescriptorProto {
            name: Some("processor.proto".to_owned()),
            package: Some("wireflow.processor".to_owned()),
            syntax: Some("proto3".to_owned()),
            message_type: vec![
                generic,
                string_list,
                header_value,
                header_entry,
                envelope,
                ping_request,
                status,
            ],
            service: vec![processor],
            ..Default::default()
        }],
    }
}
