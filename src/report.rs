use crate::analysis::{AnalysisSummary, Demo};
use std::fmt::Write;

/// Render a textual summary of a relaxation run.
///
/// The report states the problem, how the solver ended and how far the relaxed
/// value sits from the closed-form one, so results can be checked by hand
/// against references such as <https://en.wikipedia.org/wiki/Dynamic_relaxation>.
#[must_use]
pub fn render_summary(summary: &AnalysisSummary) -> String {
    let mut output = String::new();

    // Problem statement first so the reader knows what the numbers represent.
    let title = match summary.demo {
        Demo::Cantilever(properties) => format!(
            "Cantilever rod ({} handles, tip load = {:.3e} N)",
            properties.handles, properties.tip_load
        ),
        Demo::Twist(properties) => format!(
            "Twisted rod ({} handles, end rotation = {:.3} rad)",
            properties.handles, properties.angle
        ),
    };
    writeln!(&mut output, "{title}").expect("writing to string cannot fail");

    // Solver outcome, with both kinetic energies so a stalled run is obvious.
    let report = &summary.report;
    writeln!(
        &mut output,
        "Solver: {:?} after {} iterations (x peaks = {}, theta peaks = {})",
        report.state, report.iterations, report.x_peaks, report.theta_peaks
    )
    .expect("writing to string cannot fail");
    writeln!(
        &mut output,
        "Kinetic energy: x = {:.3e} J, theta = {:.3e} J",
        report.x_energy, report.theta_energy
    )
    .expect("writing to string cannot fail");

    let quantity = match summary.demo {
        Demo::Cantilever(_) => "Tip deflection (m)",
        Demo::Twist(_) => "Clamp torque (N m)",
    };
    writeln!(
        &mut output,
        "{quantity}: relaxed = {:+.6e}, closed form = {:+.6e}, error = {:.2}%",
        summary.measured,
        summary.expected,
        100.0 * summary.relative_error()
    )
    .expect("writing to string cannot fail");

    // Reactions at the first support, to check global equilibrium by hand.
    let (f, m) = (summary.reaction_force, summary.reaction_moment);
    writeln!(
        &mut output,
        "Reaction at first support: F = ({:+.3e}, {:+.3e}, {:+.3e}) N, M = ({:+.3e}, {:+.3e}, {:+.3e}) N m",
        f.x, f.y, f.z, m.x, m.y, m.z
    )
    .expect("writing to string cannot fail");

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::CantileverProperties;
    use nalgebra::Vector3;
    use rodrelax::{SolverReport, SolverState};

    #[test]
    fn formats_human_readable_report() {
        let summary = AnalysisSummary {
            demo: Demo::Cantilever(CantileverProperties::default()),
            report: SolverReport {
                state: SolverState::Converged,
                iterations: 1_234,
                x_energy: 1.0e-13,
                theta_energy: 0.0,
                x_peaks: 17,
                theta_peaks: 0,
            },
            measured: 3.3e-4,
            expected: 3.333_333e-4,
            reaction_force: Vector3::new(0.0, 0.0, 1.0e-3),
            reaction_moment: Vector3::new(0.0, 1.0e-3, 0.0),
        };
        let report = render_summary(&summary);
        assert!(report.contains("Cantilever rod (5 handles"));
        assert!(report.contains("Converged after 1234 iterations"));
        assert!(report.contains("error = 1.00%"));
    }
}
