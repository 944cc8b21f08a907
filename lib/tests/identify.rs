use cagen_lib::{
    Coord, Grid, Hrot, IdentifyOptions, PatternKind, Rule, Simulator, State, Topology, Transition,
    ALIVE,
};
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

fn identify(pattern: &str) -> Result<cagen_lib::PatternResult<Hrot>, Box<dyn Error>> {
    let rule = Hrot::life();
    let grid: Grid = pattern.parse()?;
    let mut sim = Simulator::new(&rule, grid);
    Ok(sim.identify(&IdentifyOptions::default()))
}

#[test]
fn block() -> Result<(), Box<dyn Error>> {
    let result = identify("oo/oo")?;
    assert_eq!(result.kind, PatternKind::StillLife);
    assert_eq!(result.period, 1);
    assert_eq!(result.displacement, Coord::ORIGIN);
    assert_eq!(result.to_string(), "Still Life");
    Ok(())
}

#[test]
fn blinker() -> Result<(), Box<dyn Error>> {
    let result = identify("ooo")?;
    assert_eq!(result.kind, PatternKind::Oscillator);
    assert_eq!(result.period, 2);
    assert_eq!(result.to_string(), "P2 Oscillator");
    Ok(())
}

#[test]
fn glider() -> Result<(), Box<dyn Error>> {
    let result = identify(".o./..o/ooo")?;
    assert_eq!(result.kind, PatternKind::Spaceship);
    assert_eq!(result.period, 4);
    assert_eq!(result.displacement, Coord::new(1, 1));
    assert_eq!(result.population(), 5);
    assert_eq!(result.to_string(), "(1, 1)c/4 Spaceship");
    Ok(())
}

#[test]
fn orientation_does_not_matter() -> Result<(), Box<dyn Error>> {
    let rule = Hrot::life();
    let options = IdentifyOptions::new(100).set_orientation_invariant(true);
    let glider: Grid = ".o./..o/ooo".parse()?;
    let a = Simulator::new(&rule, glider.clone()).identify(&options);
    let b = Simulator::new(&rule, glider.rotate_cw()).identify(&options);
    assert_eq!(a.hash, b.hash);
    assert_eq!(a.canonical, b.canonical);
    assert_eq!(a.canonical.canonical(true), a.canonical);
    Ok(())
}

#[test]
fn dying_pattern() -> Result<(), Box<dyn Error>> {
    let result = identify("o")?;
    assert_eq!(result.population(), 0);
    assert_eq!(result.kind, PatternKind::StillLife);
    assert_eq!(result.period, 1);
    assert_eq!(result.displacement, Coord::ORIGIN);
    Ok(())
}

#[test]
fn long_period_is_unidentified() -> Result<(), Box<dyn Error>> {
    let rule = Hrot::life();
    let grid: Grid = ".o./..o/ooo".parse()?;
    let result = Simulator::new(&rule, grid).identify(&IdentifyOptions::new(3));
    assert_eq!(result.kind, PatternKind::Unidentified);
    assert!(!result.is_identified());
    Ok(())
}

#[test]
fn stepping_is_deterministic() -> Result<(), Box<dyn Error>> {
    let rule = Hrot::life();
    let soup: Grid = "oo.o/.ooo/o..o/.oo.".parse()?;
    let mut a = Simulator::new(&rule, soup.clone());
    let mut b = Simulator::new(&rule, soup);
    a.step_n(50);
    b.step_n(50);
    assert_eq!(a.grid(), b.grid());
    assert_eq!(a.generation(), 50);
    Ok(())
}

#[test]
fn glider_on_torus_comes_back() -> Result<(), Box<dyn Error>> {
    let rule = Hrot::life();
    let glider: Grid = ".o./..o/ooo".parse()?;
    let mut sim = Simulator::new(&rule, glider.clone()).with_topology(Topology::torus(8, 8));
    sim.step_n(32);
    assert_eq!(sim.grid(), &glider);
    Ok(())
}

#[test]
fn bounded_world_clips() -> Result<(), Box<dyn Error>> {
    let rule = Hrot::life();
    let mut sim = Simulator::new(&rule, Grid::new()).with_topology(Topology::bounded(4, 4));
    assert!(sim.set_cell(Coord::new(5, 0), ALIVE).is_err());
    assert!(sim.set_cell(Coord::new(0, 0), State(2)).is_err());
    sim.set_cell(Coord::new(1, 1), ALIVE)?;
    assert_eq!(sim.get_cell(Coord::new(1, 1)), ALIVE);
    Ok(())
}

#[test]
fn min_and_max_rules() -> Result<(), Box<dyn Error>> {
    let rule = Hrot::life();
    let glider: Grid = ".o./..o/ooo".parse()?;
    let options = IdentifyOptions::new(100).set_min_max_rule(true);
    let result = Simulator::new(&rule, glider).identify(&options);
    let (min, max) = match (result.min_rule, result.max_rule) {
        (Some(min), Some(max)) => (min, max),
        _ => return Err("no min and max rules".into()),
    };
    assert_eq!(min.birth(), vec![3]);
    assert_eq!(min.survival(), vec![2, 3]);
    assert!(rule.between(&min, &max)?);
    assert!(!max.birth().contains(&0));
    Ok(())
}

/// A rule without the rule range capability.
#[derive(Clone, Debug)]
struct Parity;

impl Display for Parity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Parity")
    }
}

impl Rule for Parity {
    fn neighbourhood(&self, _generation: u64) -> &[Coord] {
        const NEIGHBOURS: [Coord; 4] = [
            Coord::new(0, -1),
            Coord::new(-1, 0),
            Coord::new(1, 0),
            Coord::new(0, 1),
        ];
        &NEIGHBOURS
    }

    fn num_states(&self) -> usize {
        2
    }

    fn transition(&self, neighbours: &[State], _: State, _: u64, _: Coord) -> State {
        State(neighbours.iter().filter(|&&s| s == ALIVE).count() % 2)
    }
}

#[test]
fn rules_without_ranges() -> Result<(), Box<dyn Error>> {
    let rule = Parity;
    let transitions = [Transition {
        neighbours: vec![ALIVE; 4],
        state: ALIVE,
        next: State(0),
    }];
    assert!(rule.min_max_rule(&transitions).is_err());

    let options = IdentifyOptions::new(10).set_min_max_rule(true);
    let result = Simulator::new(&rule, "o".parse()?).identify(&options);
    assert!(result.min_rule.is_none());
    Ok(())
}
