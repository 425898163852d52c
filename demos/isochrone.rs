// Copyright 2023-2024 Mikael Lund
//
// Licensed under the Apache license, version 2.0 (the "license");
// you may not use this file except in compliance with the license.
// You may obtain a copy of the license at
//
//     http://www.apache.org/licenses/license-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the license is distributed on an "as is" basis,
// without warranties or conditions of any kind, either express or implied.
// See the license for the specific language governing permissions and
// limitations under the license.

//! Tabulate actions in an isochrone potential and compare with the exact values.

use staeckel_grid::potential::Isochrone;
use staeckel_grid::{ActionSolver, GridConfig, PhasePoint, StaeckelGrid};

fn main() -> anyhow::Result<()> {
    let iso = Isochrone::new(1.0, 1.0);
    let grid = StaeckelGrid::builder()
        .potential(iso)
        .config(GridConfig::default().with_delta(0.05))
        .build(&iso)?;
    println!("{:#?}", grid.stats());

    let orbits = [
        PhasePoint::new(1.0, 0.35, 0.3, 0.2, 0.3),
        PhasePoint::new(2.0, -0.2, 0.5, -0.3, 0.25),
        PhasePoint::new(0.6, 0.35, 0.25, 0.1, -0.2),
    ];
    println!(
        "{:>10} {:>10} {:>10} {:>10} {:>10}",
        "Lz", "JR grid", "JR exact", "Jz grid", "Jz exact"
    );
    for (orbit, actions) in orbits.iter().zip(grid.actions_many(&orbits)?) {
        println!(
            "{:>10.4} {:>10.5} {:>10.5} {:>10.5} {:>10.5}",
            actions.lz,
            actions.jr,
            iso.radial_action(orbit)?,
            actions.jz,
            iso.vertical_action(orbit)?
        );
    }

    let validation = grid.validate(&iso, 200)?;
    println!("{:#?}", validation);
    Ok(())
}
