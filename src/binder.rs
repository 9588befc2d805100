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

//! The binder holds at most one reservation of a binding at a time.
//!
//! ```text
//!            reserve
//!   empty ------------> reserved
//!     ^                    |
//!     '--------------------'
//!            release
//! ```
//!
//! Reserving while a reservation is held, or releasing while none is held, is an error.

use std::sync::Arc;

use binding_proto::{Binding, ResetConfig, Testbed};
use log::{debug, info, warn};
use portgraph::SolveContext;

use crate::{
    config::BindingConfig,
    dynamic_binding::build_dynamic_reservation,
    errors::{BindingError, ErrorList},
    options::Resolver,
    reservation::{BoundDevice, Reservation},
    static_binding::build_static_reservation,
};

/// Error returned by a [`Hooks`] implementation.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Actions on the devices that are triggered by the binder. The default implementation does
/// nothing.
pub trait Hooks {
    /// Bring a freshly reserved device into a known state, using the reset configuration of the
    /// binding.
    fn reset(&mut self, _device: &BoundDevice, _config: &ResetConfig) -> Result<(), HookError> {
        Ok(())
    }

    /// Close all sessions held on an ATE of a reservation that is being released.
    fn release(&mut self, _ate: &BoundDevice) -> Result<(), HookError> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoHooks;

impl Hooks for NoHooks {}

/// Reserves the devices of a binding for a testbed.
#[derive(Debug)]
pub struct Binder<H = NoHooks> {
    resolver: Resolver,
    hooks: H,
    reservation: Option<Reservation>,
}

impl Binder<NoHooks> {
    /// Create a binder without any hooks.
    pub fn new(binding: Binding, config: Arc<BindingConfig>) -> Self {
        Self {
            resolver: Resolver::new(Arc::new(binding), config),
            hooks: NoHooks,
            reservation: None,
        }
    }
}

impl<H: Hooks> Binder<H> {
    /// Replace the hooks of the binder.
    pub fn with_hooks<T: Hooks>(self, hooks: T) -> Binder<T> {
        Binder {
            resolver: self.resolver,
            hooks,
            reservation: self.reservation,
        }
    }

    /// The resolver used for all bound devices.
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// The hooks of the binder.
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// The currently held reservation, if any.
    pub fn reservation(&self) -> Option<&Reservation> {
        self.reservation.as_ref()
    }

    /// Returns `true` if a reservation is held.
    pub fn is_reserved(&self) -> bool {
        self.reservation.is_some()
    }

    /// Reserve the devices for `testbed`. A dynamic binding is solved with the timeout of the
    /// configuration.
    pub fn reserve(&mut self, testbed: &Testbed) -> Result<Reservation, BindingError> {
        let ctx = match self.resolver.config().solve_timeout() {
            Some(timeout) => SolveContext::new().with_timeout(timeout),
            None => SolveContext::new(),
        };
        self.reserve_with_context(testbed, ctx)
    }

    /// Reserve the devices for `testbed`. A dynamic binding is solved within `ctx`.
    ///
    /// If resetting is enabled, the reset hook is called on every device that has a reset
    /// configuration. The reservation is only held if all of them succeed; otherwise, the release
    /// hook is called on every ATE before the error is returned.
    pub fn reserve_with_context(
        &mut self,
        testbed: &Testbed,
        ctx: SolveContext,
    ) -> Result<Reservation, BindingError> {
        if self.reservation.is_some() {
            return Err(BindingError::AlreadyReserved);
        }

        let reservation = if self.resolver.binding().dynamic {
            build_dynamic_reservation(&ctx, testbed, &self.resolver)?
        } else {
            build_static_reservation(testbed, &self.resolver)?
        };
        info!(
            "reserved {} devices for testbed {:?} (reservation {})",
            reservation.len(),
            testbed.id,
            reservation.id()
        );

        if self.resolver.config().reset {
            if let Err(e) = self.reset(&reservation) {
                self.release_ates(&reservation);
                return Err(e);
            }
        }

        self.reservation = Some(reservation.clone());
        Ok(reservation)
    }

    fn reset(&mut self, reservation: &Reservation) -> Result<(), BindingError> {
        let mut errors: ErrorList<BindingError> = ErrorList::new();
        for device in reservation.iter() {
            let config = match device.reset_config() {
                Some(config) if !config.is_empty() => config,
                _ => continue,
            };
            debug!("reset {} {}", device.role(), device.id());
            if let Err(source) = self.hooks.reset(device, config) {
                errors.push(BindingError::Hook {
                    action: "reset",
                    role: device.role(),
                    id: device.id().to_string(),
                    source,
                });
            }
        }
        Ok(errors.into_result()?)
    }

    /// Release the held reservation. Sessions on the ATEs are released one after the other;
    /// failures are logged, but do not stop the release.
    pub fn release(&mut self) -> Result<(), BindingError> {
        let reservation = self.reservation.take().ok_or(BindingError::NotReserved)?;
        self.release_ates(&reservation);
        info!("released reservation {}", reservation.id());
        Ok(())
    }

    fn release_ates(&mut self, reservation: &Reservation) {
        for ate in reservation.ates().values() {
            if let Err(e) = self.hooks.release(ate) {
                warn!("cannot release ATE {}: {e}", ate.id());
            }
        }
    }

    /// Get the held reservation with the given id.
    pub fn fetch_reservation(&self, id: &str) -> Result<&Reservation, BindingError> {
        self.reservation
            .as_ref()
            .filter(|r| r.id() == id)
            .ok_or_else(|| BindingError::ReservationNotFound(id.to_string()))
    }
}
