// TestbedBinding: Reserving lab devices for abstract testbeds
// Copyright (C) 2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use std::sync::Arc;

use binding_proto::ResetConfig;
use portgraph::{CancelToken, SolveContext, SolveError};
use pretty_assertions::assert_eq;
use test_log::test;

use super::{binding, lab, testbed, triangle};
use crate::{Binder, BindingConfig, BindingError, BoundDevice, HookError, Hooks};

/// Hooks that record every call, and fail on the device with id `fail`.
#[derive(Debug, Default)]
struct RecordingHooks {
    reset: Vec<String>,
    released: Vec<String>,
    fail: Option<&'static str>,
}

impl Hooks for RecordingHooks {
    fn reset(&mut self, device: &BoundDevice, config: &ResetConfig) -> Result<(), HookError> {
        if device.id() == "dut1" {
            assert_eq!(config.cli, vec!["hostname r1".to_string()]);
            assert!(config.gribi_flush);
        }
        self.reset.push(device.id().to_string());
        if self.fail == Some(device.id()) {
            return Err("boom".into());
        }
        Ok(())
    }

    fn release(&mut self, ate: &BoundDevice) -> Result<(), HookError> {
        self.released.push(ate.id().to_string());
        if self.fail == Some(ate.id()) {
            return Err("session lost".into());
        }
        Ok(())
    }
}

fn config() -> Arc<BindingConfig> {
    Arc::new(BindingConfig::default())
}

#[test]
fn reserve_and_release() {
    let mut binder = Binder::new(binding(), config());
    assert!(!binder.is_reserved());

    let r = binder.reserve(&testbed()).unwrap();
    assert_eq!(r.id(), "STATIC");
    assert!(binder.is_reserved());
    assert_eq!(binder.reservation().map(|r| r.len()), Some(3));

    binder.release().unwrap();
    assert!(!binder.is_reserved());

    // the binder can be used again after releasing
    binder.reserve(&testbed()).unwrap();
    binder.release().unwrap();
}

#[test]
fn reserve_twice() {
    let mut binder = Binder::new(binding(), config());
    binder.reserve(&testbed()).unwrap();
    let err = binder.reserve(&testbed()).unwrap_err();
    assert!(matches!(err, BindingError::AlreadyReserved));
    // the first reservation is still held
    assert!(binder.is_reserved());
}

#[test]
fn release_twice() {
    let mut binder = Binder::new(binding(), config());
    assert!(matches!(binder.release(), Err(BindingError::NotReserved)));
    binder.reserve(&testbed()).unwrap();
    binder.release().unwrap();
    assert!(matches!(binder.release(), Err(BindingError::NotReserved)));
}

#[test]
fn failed_reservation_is_not_held() {
    let mut b = binding();
    b.ates.clear();
    let mut binder = Binder::new(b, config());
    let err = binder.reserve(&testbed()).unwrap_err();
    assert_eq!(err.to_string(), "missing binding for ATE \"ate\"");
    assert!(!binder.is_reserved());
    assert!(matches!(binder.release(), Err(BindingError::NotReserved)));
}

#[test]
fn fetch_reservation() {
    let mut binder = Binder::new(binding(), config());
    assert!(matches!(
        binder.fetch_reservation("STATIC"),
        Err(BindingError::ReservationNotFound(_))
    ));
    binder.reserve(&testbed()).unwrap();
    assert_eq!(binder.fetch_reservation("STATIC").unwrap().len(), 3);
    let err = binder.fetch_reservation("other").unwrap_err();
    assert_eq!(err.to_string(), "reservation \"other\" not found");
}

#[test]
fn reset_hooks() {
    let mut binder = Binder::new(binding(), config()).with_hooks(RecordingHooks::default());
    binder.reserve(&testbed()).unwrap();
    // only dut1 has a reset configuration
    assert_eq!(binder.hooks().reset, vec!["dut1".to_string()]);

    binder.release().unwrap();
    assert_eq!(binder.hooks().released, vec!["ate".to_string()]);
}

#[test]
fn reset_disabled() {
    let config = BindingConfig {
        reset: false,
        ..Default::default()
    };
    let mut binder = Binder::new(binding(), Arc::new(config)).with_hooks(RecordingHooks {
        fail: Some("dut1"),
        ..Default::default()
    });
    binder.reserve(&testbed()).unwrap();
    assert!(binder.hooks().reset.is_empty());
}

#[test]
fn failed_reset() {
    let mut binder = Binder::new(binding(), config()).with_hooks(RecordingHooks {
        fail: Some("dut1"),
        ..Default::default()
    });
    let err = binder.reserve(&testbed()).unwrap_err();
    assert!(matches!(err, BindingError::Hook { action: "reset", .. }));
    assert_eq!(err.to_string(), "reset of DUT \"dut1\" failed: boom");
    assert!(!binder.is_reserved());
}

#[test]
fn failed_reset_releases_ates() {
    let mut b = binding();
    b.ates[0].config = Some(ResetConfig {
        cli: vec!["reset".to_string()],
        ..Default::default()
    });
    let mut binder = Binder::new(b, config()).with_hooks(RecordingHooks {
        fail: Some("dut1"),
        ..Default::default()
    });
    let err = binder.reserve(&testbed()).unwrap_err();
    assert_eq!(err.to_string(), "reset of DUT \"dut1\" failed: boom");
    assert_eq!(
        binder.hooks().reset,
        vec!["dut1".to_string(), "ate".to_string()]
    );
    // sessions opened while resetting are closed again
    assert_eq!(binder.hooks().released, vec!["ate".to_string()]);
    assert!(matches!(binder.release(), Err(BindingError::NotReserved)));
}

#[test]
fn failed_release_is_best_effort() {
    let mut binder = Binder::new(binding(), config()).with_hooks(RecordingHooks {
        fail: Some("ate"),
        ..Default::default()
    });
    binder.reserve(&testbed()).unwrap();
    binder.release().unwrap();
    assert_eq!(binder.hooks().released, vec!["ate".to_string()]);
    assert!(!binder.is_reserved());
}

#[test]
fn dynamic_binder() {
    let mut binder = Binder::new(lab(), config());
    let r = binder.reserve(&triangle()).unwrap();
    assert_eq!(r.len(), 3);
    assert_eq!(binder.fetch_reservation(r.id()).unwrap().id(), r.id());
    assert!(matches!(
        binder.fetch_reservation("STATIC"),
        Err(BindingError::ReservationNotFound(_))
    ));
    binder.release().unwrap();

    let token = CancelToken::new();
    token.cancel();
    let err = binder
        .reserve_with_context(&triangle(), SolveContext::new().with_cancel(token))
        .unwrap_err();
    assert!(matches!(err, BindingError::Solve(SolveError::Cancelled)));
    assert!(!binder.is_reserved());
}

#[test]
fn configured_solve_timeout() {
    let expired = BindingConfig {
        solve_timeout_secs: Some(0),
        ..Default::default()
    };
    let mut binder = Binder::new(lab(), Arc::new(expired));
    let err = binder.reserve(&triangle()).unwrap_err();
    assert!(matches!(err, BindingError::Solve(SolveError::Timeout)));
    assert!(!binder.is_reserved());

    // without a timeout, the same testbed can be reserved
    let mut binder = Binder::new(lab(), config());
    binder.reserve(&triangle()).unwrap();
}
