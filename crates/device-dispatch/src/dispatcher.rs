use device_catalog::{catalog, DeviceCatalog, DeviceTypeId, Identity, MethodDescriptor};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{DeviceCommInterface, DispatchError, DispatchMetrics, Result, StatusCode, Value};

/// One incoming method call; lives only for a single dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingCall {
    pub device_type: DeviceTypeId,
    pub identity: Identity,
    pub method_id: u32,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

impl PendingCall {
    pub fn new(
        device_type: DeviceTypeId,
        identity: Identity,
        method_id: u32,
        arguments: Vec<Value>,
    ) -> Self {
        Self {
            device_type,
            identity,
            method_id,
            arguments,
        }
    }
}

/// A call that passed validation, with the interface's status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchOutcome {
    pub method: &'static MethodDescriptor,
    pub status: StatusCode,
}

/// Validates calls against the catalog and forwards them to `C`.
///
/// Holds no per-call state and no locks; share it freely between threads.
pub struct Dispatcher<C> {
    interface: C,
    catalog: &'static DeviceCatalog,
    metrics: Option<DispatchMetrics>,
}

impl<C: DeviceCommInterface> Dispatcher<C> {
    pub fn new(interface: C) -> Self {
        Self {
            interface,
            catalog: catalog(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: DispatchMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn interface(&self) -> &C {
        &self.interface
    }

    pub fn metrics(&self) -> Option<&DispatchMetrics> {
        self.metrics.as_ref()
    }

    /// Resolve the method and check arity and argument types.
    ///
    /// Arity is checked first and fails on its own. Types are checked for
    /// every argument before failing, so the error lists each bad position.
    pub fn validate(&self, call: &PendingCall) -> Result<&'static MethodDescriptor> {
        let method = self
            .catalog
            .lookup_method(call.device_type, call.method_id)
            .map_err(|_| DispatchError::InvalidMethod {
                device_type: call.device_type,
                method_id: call.method_id,
            })?;

        if call.arguments.len() != method.arity() {
            return Err(DispatchError::InvalidArgumentCount {
                method: method.name,
                expected: method.arity(),
                actual: call.arguments.len(),
            });
        }

        let results: Vec<StatusCode> = method
            .arguments
            .iter()
            .zip(&call.arguments)
            .map(|(decl, actual)| {
                if actual.data_type() == decl.data_type {
                    StatusCode::Good
                } else {
                    debug!(
                        method = method.name,
                        argument = decl.name,
                        expected = %decl.data_type,
                        actual = %actual.data_type(),
                        "argument type mismatch"
                    );
                    StatusCode::BadTypeMismatch
                }
            })
            .collect();
        if results.iter().any(|s| !s.is_good()) {
            return Err(DispatchError::TypeMismatch {
                method: method.name,
                results,
            });
        }
        Ok(method)
    }

    /// Validate `call` and, if it is well formed, hand it to the interface.
    ///
    /// `Ok` carries whatever status the interface returned, bad or good;
    /// `Err` means the call was rejected locally and the interface was not
    /// touched.
    pub fn dispatch(&self, call: &PendingCall) -> Result<DispatchOutcome> {
        if let Some(m) = &self.metrics {
            m.calls
                .with_label_values(&[call.device_type.name()])
                .inc();
        }

        let method = match self.validate(call) {
            Ok(method) => method,
            Err(e) => {
                warn!(
                    device_type = %call.device_type,
                    identity = %call.identity,
                    method_id = call.method_id,
                    error = %e,
                    "rejected method call"
                );
                if let Some(m) = &self.metrics {
                    m.rejected.with_label_values(&[e.reason()]).inc();
                }
                return Err(e);
            }
        };

        info!(
            device_type = %call.device_type,
            identity = %call.identity,
            method = method.name,
            args = call.arguments.len(),
            "operating device"
        );
        let status = self.interface.operate(
            call.device_type,
            &call.identity,
            call.method_id,
            &call.arguments,
        );
        if status.is_bad() {
            warn!(method = method.name, identity = %call.identity, %status, "device reported failure");
        } else {
            debug!(method = method.name, identity = %call.identity, %status, "device call completed");
        }
        if let Some(m) = &self.metrics {
            m.device_status.with_label_values(&[status.name()]).inc();
        }
        Ok(DispatchOutcome { method, status })
    }

    /// Like [`Dispatcher::dispatch`] but folds local rejections into the
    /// status code returned to a remote caller.
    pub fn call(&self, call: &PendingCall) -> StatusCode {
        match self.dispatch(call) {
            Ok(outcome) => outcome.status,
            Err(e) => e.status(),
        }
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::RecordingInterface;
    use device_catalog::ids::*;
    use std::sync::Arc;
    use std::thread;

    fn panel() -> Identity {
        Identity {
            serial_number: 2411,
            e_address: "172.17.10.11".to_string(),
            position: 1111,
            name: "Panel_1111".to_string(),
        }
    }

    fn dispatcher() -> Dispatcher<Arc<RecordingInterface>> {
        Dispatcher::new(Arc::new(RecordingInterface::new()))
    }

    #[test]
    fn forwards_valid_call_verbatim() {
        let d = dispatcher();
        let call = PendingCall::new(
            DeviceTypeId::Panel,
            panel(),
            PANEL_FIND_HOME,
            vec![Value::Int32(-1)],
        );
        let out = d.dispatch(&call).unwrap();
        assert_eq!(out.status, StatusCode::Good);
        assert_eq!(out.method.name, "FindHome");

        let calls = d.interface().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].device_type, DeviceTypeId::Panel);
        assert_eq!(calls[0].identity, panel());
        assert_eq!(calls[0].method_id, PANEL_FIND_HOME);
        assert_eq!(calls[0].args, vec![Value::Int32(-1)]);
    }

    #[test]
    fn device_status_propagates_unchanged() {
        let d = dispatcher();
        d.interface().set_status(StatusCode::BadInvalidState);
        let call = PendingCall::new(DeviceTypeId::Panel, panel(), PANEL_STOP, vec![]);
        let out = d.dispatch(&call).unwrap();
        assert_eq!(out.status, StatusCode::BadInvalidState);

        d.interface().set_status(StatusCode::Device(0x8123_0000));
        assert_eq!(d.call(&call), StatusCode::Device(0x8123_0000));
        assert_eq!(d.interface().calls().len(), 2);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let d = dispatcher();
        let call = PendingCall::new(DeviceTypeId::Ccd, Identity::with_serial(1), PANEL_STOP, vec![]);
        let err = d.dispatch(&call).unwrap_err();
        assert_eq!(
            err,
            DispatchError::InvalidMethod {
                device_type: DeviceTypeId::Ccd,
                method_id: PANEL_STOP
            }
        );
        assert_eq!(err.status(), StatusCode::BadInvalidArgument);
        assert!(d.interface().calls().is_empty());
    }

    #[test]
    fn clear_error_without_argument_is_rejected() {
        let d = dispatcher();
        let call = PendingCall::new(DeviceTypeId::Panel, panel(), PANEL_CLEAR_ERROR, vec![]);
        let err = d.dispatch(&call).unwrap_err();
        assert_eq!(
            err,
            DispatchError::InvalidArgumentCount {
                method: "ClearError",
                expected: 1,
                actual: 0
            }
        );
        assert!(d.interface().calls().is_empty());
    }

    #[test]
    fn ccd_stop_with_arguments_is_rejected() {
        let d = dispatcher();
        for n in 1..4 {
            let args = vec![Value::Int32(0); n];
            let call = PendingCall::new(DeviceTypeId::Ccd, Identity::with_serial(7), CCD_STOP, args);
            assert!(matches!(
                d.dispatch(&call),
                Err(DispatchError::InvalidArgumentCount {
                    expected: 0,
                    actual,
                    ..
                }) if actual == n
            ));
        }
        assert!(d.interface().calls().is_empty());
    }

    #[test]
    fn arity_mismatch_never_reaches_interface() {
        let d = dispatcher();
        for dev in catalog().iter() {
            for m in dev.methods.values() {
                let args = vec![Value::Boolean(true); m.arity() + 1];
                let call = PendingCall::new(dev.device_type, Identity::default(), m.field_id, args);
                assert!(matches!(
                    d.dispatch(&call),
                    Err(DispatchError::InvalidArgumentCount { .. })
                ));
                if m.arity() > 0 {
                    let args = vec![Value::Boolean(true); m.arity() - 1];
                    let call =
                        PendingCall::new(dev.device_type, Identity::default(), m.field_id, args);
                    assert!(matches!(
                        d.dispatch(&call),
                        Err(DispatchError::InvalidArgumentCount { .. })
                    ));
                }
            }
        }
        assert!(d.interface().calls().is_empty());
    }

    #[test]
    fn type_mismatch_reports_every_bad_argument() {
        let d = dispatcher();
        let call = PendingCall::new(
            DeviceTypeId::Edge,
            Identity::with_serial(1),
            EDGE_ALIGN,
            vec![
                Value::Int32(1),
                Value::UInt32(2),
                Value::Float(0.25),
                Value::Boolean(true),
            ],
        );
        let err = d.dispatch(&call).unwrap_err();
        assert_eq!(
            err,
            DispatchError::TypeMismatch {
                method: "Align",
                results: vec![
                    StatusCode::BadTypeMismatch,
                    StatusCode::Good,
                    StatusCode::BadTypeMismatch,
                    StatusCode::Good
                ]
            }
        );
        assert_eq!(err.status(), StatusCode::BadTypeMismatch);
        assert!(err.to_string().contains("[0, 2]"));
        assert!(d.interface().calls().is_empty());
    }

    #[test]
    fn float_arguments_are_not_widened() {
        let d = dispatcher();
        let call = PendingCall::new(
            DeviceTypeId::Panel,
            panel(),
            PANEL_MOVE_DELTA_LENGTHS,
            vec![Value::Double(0.1); 6],
        );
        assert!(matches!(
            d.dispatch(&call),
            Err(DispatchError::TypeMismatch { .. })
        ));
        let call = PendingCall::new(
            DeviceTypeId::Panel,
            panel(),
            PANEL_MOVE_DELTA_LENGTHS,
            vec![Value::Float(0.1); 6],
        );
        assert!(d.dispatch(&call).is_ok());
    }

    #[test]
    fn metrics_count_calls_and_rejections() {
        let metrics = DispatchMetrics::new().unwrap();
        let d = Dispatcher::new(RecordingInterface::new()).with_metrics(metrics);
        let ok = PendingCall::new(DeviceTypeId::Ccd, Identity::default(), CCD_START, vec![]);
        let bad = PendingCall::new(
            DeviceTypeId::Ccd,
            Identity::default(),
            CCD_START,
            vec![Value::Int32(1)],
        );
        d.dispatch(&ok).unwrap();
        let _ = d.dispatch(&bad);
        let m = d.metrics().unwrap();
        assert_eq!(m.calls.with_label_values(&["CCD"]).get(), 2);
        assert_eq!(
            m.rejected
                .with_label_values(&["invalid_argument_count"])
                .get(),
            1
        );
        assert_eq!(m.device_status.with_label_values(&["Good"]).get(), 1);
        assert!(m.encode_text().contains("pas_dispatch_calls_total"));
    }

    #[test]
    fn concurrent_calls_share_one_dispatcher() {
        let d = Arc::new(dispatcher());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let d = Arc::clone(&d);
                thread::spawn(move || {
                    let call = PendingCall::new(
                        DeviceTypeId::Panel,
                        Identity::with_serial(i),
                        PANEL_CLEAR_ERROR,
                        vec![Value::Int32(i)],
                    );
                    d.dispatch(&call).map(|o| o.status)
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), Ok(StatusCode::Good));
        }
        assert_eq!(d.interface().calls().len(), 4);
    }

    #[test]
    fn pending_call_survives_json() {
        let call = PendingCall::new(
            DeviceTypeId::Panel,
            panel(),
            PANEL_MOVE_TO_COORDS,
            vec![
                Value::Double(1.5),
                Value::Float(-0.25),
                Value::Int32(-3),
                Value::UInt32(7),
                Value::Boolean(true),
                Value::String("x".to_string()),
            ],
        );
        let json = serde_json::to_string(&call).unwrap();
        assert!(json.contains(r#"{"type":"Double","value":1.5}"#), "{json}");
        assert!(json.contains(r#""device_type":"panel""#), "{json}");
        let back: PendingCall = serde_json::from_str(&json).unwrap();
        assert_eq!(back, call);

        // arguments may be omitted
        let json = r#"{"device_type":"ccd","identity":{"serial_number":5},"method_id":3121}"#;
        let bare: PendingCall = serde_json::from_str(json).unwrap();
        assert_eq!(bare.device_type, DeviceTypeId::Ccd);
        assert!(bare.arguments.is_empty());
        assert_eq!(dispatcher().call(&bare), StatusCode::Good);
    }
}
