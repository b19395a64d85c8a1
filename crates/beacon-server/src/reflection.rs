//! `grpc.reflection.v1` server reflection.
//!
//! Reflection only describes what it is fed: every service the server
//! exposes should contribute its file descriptor set here. The health
//! service's set ships with `tonic-health`; see [`ReflectionService::with_health`].

use prost_types::FileDescriptorSet;
use tonic::service::RoutesBuilder;

use crate::error::RegistrationError;
use crate::registrar::ServiceRegistrar;

/// Registrar for the reflection service.
#[derive(Debug, Clone, Default)]
pub struct ReflectionService {
    encoded: Vec<&'static [u8]>,
    sets: Vec<FileDescriptorSet>,
}

impl ReflectionService {
    /// Reflection describing only itself.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a protobuf-encoded `FileDescriptorSet`.
    #[must_use]
    pub fn encoded_file_descriptor_set(mut self, bytes: &'static [u8]) -> Self {
        self.encoded.push(bytes);
        self
    }

    /// Adds a decoded `FileDescriptorSet`.
    #[must_use]
    pub fn file_descriptor_set(mut self, set: FileDescriptorSet) -> Self {
        self.sets.push(set);
        self
    }

    /// Adds `grpc.health.v1`.
    #[must_use]
    pub fn with_health(self) -> Self {
        self.encoded_file_descriptor_set(tonic_health::pb::FILE_DESCRIPTOR_SET)
    }
}

impl ServiceRegistrar for ReflectionService {
    fn name(&self) -> &str {
        "reflection"
    }

    fn register(&self, routes: &mut RoutesBuilder) -> Result<(), RegistrationError> {
        let mut builder = tonic_reflection::server::Builder::configure();
        for &bytes in &self.encoded {
            builder = builder.register_encoded_file_descriptor_set(bytes);
        }
        for set in &self.sets {
            builder = builder.register_file_descriptor_set(set.clone());
        }

        let service = builder.build_v1().map_err(RegistrationError::failed)?;
        routes.add_service(service);
        Ok(())
    }
}
