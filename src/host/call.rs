//! Schema-checked reflected calls.
//!
//! The engine's raw invocation takes a parameter block whose layout must
//! match the target function exactly. Here a function is described by a
//! [`FunctionSignature`] (ordered, typed parameters plus an optional return
//! kind) and [`call`] checks the arguments against it before anything is
//! handed to the engine. A mismatch is reported as
//! [`HostError::SignatureMismatch`].

use super::{HostError, LookupKind, ObjectHandle, ObjectModel, Value, ValueKind};

/// One input parameter of a reflected function.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ValueKind,
}

/// Ordered parameter schema of a reflected function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Param>,
    pub returns: Option<ValueKind>,
}

impl FunctionSignature {
    pub fn new(name: impl Into<String>) -> Self {
        FunctionSignature {
            name: name.into(),
            params: Vec::new(),
            returns: None,
        }
    }

    pub fn param(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.params.push(Param {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn returns(mut self, kind: ValueKind) -> Self {
        self.returns = Some(kind);
        self
    }

    /// Check argument count and per-position kinds.
    pub fn check_args(&self, args: &[Value]) -> Result<(), HostError> {
        if args.len() != self.params.len() {
            return Err(self.mismatch(format!(
                "expected {} arguments, got {}",
                self.params.len(),
                args.len()
            )));
        }
        for (index, (param, arg)) in self.params.iter().zip(args).enumerate() {
            if param.kind != arg.kind() {
                return Err(self.mismatch(format!(
                    "argument {} ({}) is {:?}, expected {:?}",
                    index,
                    param.name,
                    arg.kind(),
                    param.kind
                )));
            }
        }
        Ok(())
    }

    /// Check that the engine handed back what the signature promised.
    pub fn check_return(&self, ret: &Option<Value>) -> Result<(), HostError> {
        match (self.returns, ret) {
            (None, None) => Ok(()),
            (Some(expected), Some(value)) if value.kind() == expected => Ok(()),
            (Some(expected), Some(value)) => Err(self.mismatch(format!(
                "returned {:?}, expected {:?}",
                value.kind(),
                expected
            ))),
            (Some(expected), None) => {
                Err(self.mismatch(format!("returned nothing, expected {:?}", expected)))
            }
            (None, Some(value)) => Err(self.mismatch(format!(
                "returned {:?} from a function without a return value",
                value.kind()
            ))),
        }
    }

    fn mismatch(&self, reason: String) -> HostError {
        HostError::SignatureMismatch {
            function: self.name.clone(),
            reason,
        }
    }
}

/// Call `function` on `object` by name after checking `args` against the
/// function's signature.
///
/// The function is looked up on the object's class and its ancestors.
/// Returns the function's return value, if it declares one.
pub fn call(
    host: &dyn ObjectModel,
    object: ObjectHandle,
    function: &str,
    args: &[Value],
) -> Result<Option<Value>, HostError> {
    if !host.is_valid(object) {
        return Err(HostError::StaleHandle(object));
    }
    let class = host
        .object_class(object)
        .ok_or(HostError::StaleHandle(object))?;
    let handle = host
        .find_function(class, function)
        .ok_or_else(|| HostError::NotFound {
            kind: LookupKind::Function,
            name: function.to_string(),
        })?;
    let signature = host
        .function_signature(handle)
        .ok_or_else(|| HostError::SignatureMismatch {
            function: function.to_string(),
            reason: "function has no parameter schema".to_string(),
        })?;

    signature.check_args(args)?;
    let ret = host.process_event(object, handle, args)?;
    signature.check_return(&ret)?;
    Ok(ret)
}

/// [`call`] for functions that must return a value.
pub fn call_returning(
    host: &dyn ObjectModel,
    object: ObjectHandle,
    function: &str,
    args: &[Value],
) -> Result<Value, HostError> {
    call(host, object, function, args)?.ok_or_else(|| HostError::SignatureMismatch {
        function: function.to_string(),
        reason: "function has no return value".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::mock::MockHost;
    use crate::host::{Rotator, Transform};

    fn sig() -> FunctionSignature {
        FunctionSignature::new("K2_AttachTo")
            .param("Parent", ValueKind::Object)
            .param("SocketName", ValueKind::Name)
            .returns(ValueKind::Bool)
    }

    #[test]
    fn test_check_args_wrong_count() {
        let err = sig().check_args(&[Value::Object(None)]).unwrap_err();
        assert!(matches!(err, HostError::SignatureMismatch { .. }));
    }

    #[test]
    fn test_check_args_wrong_kind() {
        let err = sig()
            .check_args(&[Value::Object(None), Value::Int(0)])
            .unwrap_err();
        match err {
            HostError::SignatureMismatch { function, reason } => {
                assert_eq!(function, "K2_AttachTo");
                assert!(reason.contains("SocketName"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_check_return_missing_value() {
        assert!(sig().check_return(&None).is_err());
        assert!(sig().check_return(&Some(Value::Bool(true))).is_ok());
    }

    #[test]
    fn test_call_rejects_mismatched_arguments_before_invoking() {
        let host = MockHost::with_engine_classes();
        let actor = host.spawn_actor(&Transform::IDENTITY, 1, None).unwrap();

        let err = call(&host, actor, "AddComponentByClass", &[Value::Bool(true)]).unwrap_err();
        assert!(matches!(err, HostError::SignatureMismatch { .. }));
        assert_eq!(host.call_count("AddComponentByClass"), 0);
    }

    #[test]
    fn test_call_unknown_function() {
        let host = MockHost::with_engine_classes();
        let actor = host.spawn_actor(&Transform::IDENTITY, 1, None).unwrap();

        let err = call(&host, actor, "DoesNotExist", &[]).unwrap_err();
        assert!(matches!(
            err,
            HostError::NotFound {
                kind: LookupKind::Function,
                ..
            }
        ));
    }

    #[test]
    fn test_call_on_destroyed_object_is_stale() {
        let host = MockHost::with_engine_classes();
        let actor = host.spawn_actor(&Transform::IDENTITY, 1, None).unwrap();
        host.destroy_externally(actor);

        let err = call(&host, actor, "K2_DestroyActor", &[]).unwrap_err();
        assert_eq!(err, HostError::StaleHandle(actor));
    }

    #[test]
    fn test_call_returning_value() {
        let host = MockHost::with_engine_classes();
        let class = host.find_class(crate::host::MATH_LIBRARY_CLASS).unwrap();
        let math = host
            .class_default_object(class)
            .expect("math library default object");

        let forward = call_returning(
            &host,
            math,
            "GetForwardVector",
            &[Value::Rotator(Rotator::ZERO)],
        )
        .unwrap();
        let v = forward.as_vector().unwrap();
        assert!((v.x - 1.0).abs() < 1e-5);
    }
}
