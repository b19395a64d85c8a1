//! Capability-based service registration.
//!
//! Every service module hands the lifecycle a [`ServiceRegistrar`]: a value
//! that knows how to attach its gRPC handlers to the shared route table. The
//! lifecycle runs them in order before any socket is bound, so a failing
//! registrar never exposes a port.
//!
//! # Example
//!
//! ```rust,ignore
//! use beacon_server::{registrar_fn, ServiceRegistrar};
//!
//! let beacon = registrar_fn("beacon", move |routes| {
//!     routes.add_service(BeaconServer::new(service.clone()));
//!     Ok(())
//! });
//! ```

use std::fmt;
use std::sync::Arc;

use tonic::service::RoutesBuilder;

use crate::error::RegistrationError;

/// Something that can attach its RPC methods to a server and may fail doing so.
pub trait ServiceRegistrar: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Adds this module's services to `routes`.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError` if the module cannot be attached.
    fn register(&self, routes: &mut RoutesBuilder) -> Result<(), RegistrationError>;
}

/// An absent module registers as [`RegistrationError::NilReceiver`].
impl<R: ServiceRegistrar> ServiceRegistrar for Option<R> {
    fn name(&self) -> &str {
        self.as_ref().map_or("<none>", |inner| inner.name())
    }

    fn register(&self, routes: &mut RoutesBuilder) -> Result<(), RegistrationError> {
        match self {
            Some(inner) => inner.register(routes),
            None => Err(RegistrationError::NilReceiver),
        }
    }
}

impl<R: ServiceRegistrar + ?Sized> ServiceRegistrar for Arc<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn register(&self, routes: &mut RoutesBuilder) -> Result<(), RegistrationError> {
        (**self).register(routes)
    }
}

impl<R: ServiceRegistrar + ?Sized> ServiceRegistrar for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn register(&self, routes: &mut RoutesBuilder) -> Result<(), RegistrationError> {
        (**self).register(routes)
    }
}

/// A registrar backed by a closure. Built with [`registrar_fn`].
pub struct FnRegistrar<F> {
    name: String,
    register: F,
}

impl<F> fmt::Debug for FnRegistrar<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRegistrar")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F> ServiceRegistrar for FnRegistrar<F>
where
    F: Fn(&mut RoutesBuilder) -> Result<(), RegistrationError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn register(&self, routes: &mut RoutesBuilder) -> Result<(), RegistrationError> {
        (self.register)(routes)
    }
}

/// Turns a closure into a named [`ServiceRegistrar`].
pub fn registrar_fn<F>(name: impl Into<String>, register: F) -> FnRegistrar<F>
where
    F: Fn(&mut RoutesBuilder) -> Result<(), RegistrationError> + Send + Sync,
{
    FnRegistrar {
        name: name.into(),
        register,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Named;

    impl ServiceRegistrar for Named {
        fn register(&self, _routes: &mut RoutesBuilder) -> Result<(), RegistrationError> {
            Ok(())
        }
    }

    #[test]
    fn test_default_name_is_type_name() {
        assert!(Named.name().ends_with("Named"));
    }

    #[test]
    fn test_registrar_fn_runs_closure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let registrar = registrar_fn("counting", move |_routes| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let mut routes = RoutesBuilder::default();
        registrar.register(&mut routes).unwrap();
        registrar.register(&mut routes).unwrap();

        assert_eq!(registrar.name(), "counting");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_registrar_fn_propagates_error() {
        let registrar = registrar_fn("broken", |_routes| {
            Err(RegistrationError::failed("no handlers"))
        });

        let err = registrar.register(&mut RoutesBuilder::default()).unwrap_err();
        assert_eq!(err.to_string(), "no handlers");
    }

    #[test]
    fn test_absent_module_is_nil_receiver() {
        let missing: Option<Named> = None;

        let err = missing.register(&mut RoutesBuilder::default()).unwrap_err();
        assert!(matches!(err, RegistrationError::NilReceiver));
        assert_eq!(missing.name(), "<none>");
    }

    #[test]
    fn test_present_module_registers() {
        let present = Some(registrar_fn("present", |_routes| Ok(())));
        assert!(present.register(&mut RoutesBuilder::default()).is_ok());
        assert_eq!(present.name(), "present");
    }

    #[test]
    fn test_boxed_and_shared_registrars() {
        let boxed: Box<dyn ServiceRegistrar> = Box::new(registrar_fn("boxed", |_| Ok(())));
        let shared = Arc::new(registrar_fn("shared", |_| Ok(())));

        assert_eq!(boxed.name(), "boxed");
        assert_eq!(shared.name(), "shared");
        assert!(boxed.register(&mut RoutesBuilder::default()).is_ok());
        assert!(shared.register(&mut RoutesBuilder::default()).is_ok());
    }
}
