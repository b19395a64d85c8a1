//! `FileDescriptorSet` for `grpcbeacon/v1/beacon.proto`, fed to server
//! reflection. Keep in step with the `.proto` file.

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MessageOptions, MethodDescriptorProto, ServiceDescriptorProto,
};

/// Proto file name as registered with reflection.
pub const FILE_NAME: &str = "grpcbeacon/v1/beacon.proto";

const PACKAGE: &str = "grpcbeacon.v1";

fn field(name: &str, json_name: &str, number: i32, kind: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        json_name: Some(json_name.to_string()),
        number: Some(number),
        label: Some(Label::Optional.into()),
        r#type: Some(kind.into()),
        ..FieldDescriptorProto::default()
    }
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..DescriptorProto::default()
    }
}

fn details_entry() -> DescriptorProto {
    DescriptorProto {
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..MessageOptions::default()
        }),
        ..message(
            "DetailsEntry",
            vec![
                field("key", "key", 1, Type::String),
                field("value", "value", 2, Type::String),
            ],
        )
    }
}

fn signal_response() -> DescriptorProto {
    let details = FieldDescriptorProto {
        label: Some(Label::Repeated.into()),
        type_name: Some(format!(".{PACKAGE}.SignalResponse.DetailsEntry")),
        ..field("details", "details", 2, Type::Message)
    };

    DescriptorProto {
        nested_type: vec![details_entry()],
        ..message(
            "SignalResponse",
            vec![field("reply", "reply", 1, Type::String), details],
        )
    }
}

/// Descriptor set describing `grpcbeacon.v1.Beacon` and its messages.
#[must_use]
pub fn file_descriptor_set() -> FileDescriptorSet {
    let file = FileDescriptorProto {
        name: Some(FILE_NAME.to_string()),
        package: Some(PACKAGE.to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![
            message(
                "SignalRequest",
                vec![field("message", "message", 1, Type::String)],
            ),
            signal_response(),
        ],
        service: vec![ServiceDescriptorProto {
            name: Some("Beacon".to_string()),
            method: vec![MethodDescriptorProto {
                name: Some("Signal".to_string()),
                input_type: Some(format!(".{PACKAGE}.SignalRequest")),
                output_type: Some(format!(".{PACKAGE}.SignalResponse")),
                ..MethodDescriptorProto::default()
            }],
            ..ServiceDescriptorProto::default()
        }],
        ..FileDescriptorProto::default()
    };

    FileDescriptorSet { file: vec![file] }
}
