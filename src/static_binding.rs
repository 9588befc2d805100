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

//! Static reservations: testbed devices and ports are bound to the binding devices and ports with
//! the same logical id.

use std::collections::BTreeMap;

use binding_proto::{Role, Testbed};
use log::debug;

use crate::{
    errors::{BindingError, ErrorList},
    options::Resolver,
    reservation::{BoundDevice, Dims, PortDims, Reservation},
};

/// Identifier of every static reservation.
pub const STATIC_RESERVATION_ID: &str = "STATIC";

/// Bind every device of `testbed` to the device of the binding with the same id.
///
/// Every testbed device must have a binding device with the same id, and every testbed port must
/// exist on that binding device. Additional binding ports are ignored, but every binding device
/// must be used by the testbed. All violations are reported together, and no reservation is
/// returned if there is any.
pub fn build_static_reservation(
    testbed: &Testbed,
    resolver: &Resolver,
) -> Result<Reservation, BindingError> {
    let binding = resolver.binding();
    let mut errors: ErrorList<BindingError> = ErrorList::new();
    let mut reservation = Reservation::new(STATIC_RESERVATION_ID);

    for role in Role::ALL {
        for requested in testbed.devices(role) {
            let device = match binding.device(role, &requested.id) {
                Some(device) => device,
                None => {
                    errors.push(BindingError::MissingBinding {
                        role,
                        id: requested.id.clone(),
                    });
                    continue;
                }
            };

            let mut ports = BTreeMap::new();
            for port in requested.ports.iter() {
                match device.port(&port.id) {
                    Some(bound) => {
                        ports.insert(port.id.clone(), PortDims::new(bound, port));
                    }
                    None => errors.push(BindingError::MissingPort {
                        role,
                        device: requested.id.clone(),
                        port: port.id.clone(),
                    }),
                }
            }

            let dims = Dims::new(device, requested, ports);
            reservation.insert(BoundDevice::new(
                requested.id.clone(),
                role,
                dims,
                device,
                resolver.clone(),
            ));
        }

        for device in binding.devices(role) {
            if testbed.device(role, &device.id).is_none() {
                errors.push(BindingError::NotInTestbed {
                    role,
                    id: device.id.clone(),
                });
            }
        }
    }

    errors.into_result()?;
    debug!(
        "statically bound {} DUTs and {} ATEs of testbed {:?}",
        reservation.duts().len(),
        reservation.ates().len(),
        testbed.id
    );
    Ok(reservation)
}
