use crate::generalize::{PathCommand, Ring};

/// Split a command stream into rings, one per `MoveTo`.
///
/// Each ring lists its vertices once, without repeating the first point at the
/// end. Curves contribute only their end point. Commands before the first
/// `MoveTo` start a ring of their own.
pub fn parse_path(commands: &[PathCommand]) -> Vec<Ring> {
    let mut rings = Vec::new();
    let mut current: Ring = Vec::new();
    for command in commands {
        match *command {
            PathCommand::MoveTo(point) => {
                if !current.is_empty() {
                    rings.push(std::mem::take(&mut current));
                }
                current.push(point);
            }
            PathCommand::LineTo(point) | PathCommand::CurveTo { to: point, .. } => current.push(point),
        }
    }
    if !current.is_empty() {
        rings.push(current);
    }
    for ring in &mut rings {
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
    }
    rings
}

#[cfg(test)]
mod tests {
    use super::parse_path;
    use crate::generalize::PathCommand::{CurveTo, LineTo, MoveTo};
    use geo::Coord;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    #[test]
    fn splits_on_move_to() {
        let commands = [
            MoveTo(c(0.0, 0.0)),
            LineTo(c(0.0, 2.0)),
            LineTo(c(2.0, 2.0)),
            LineTo(c(2.0, 0.0)),
            MoveTo(c(5.0, 5.0)),
            LineTo(c(5.0, 6.0)),
            CurveTo { c1: c(5.5, 6.5), c2: c(6.5, 6.5), to: c(7.0, 6.0) },
            LineTo(c(5.0, 5.0)),
        ];
        let rings = parse_path(&commands);
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0], vec![c(0.0, 0.0), c(0.0, 2.0), c(2.0, 2.0), c(2.0, 0.0)]);
        // Explicit closing point is dropped.
        assert_eq!(rings[1], vec![c(5.0, 5.0), c(5.0, 6.0), c(7.0, 6.0)]);
    }

    #[test]
    fn empty_stream_has_no_rings() {
        assert!(parse_path(&[]).is_empty());
    }
}
