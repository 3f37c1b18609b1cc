//! Text output formatter

use super::DocumentReport;

pub fn output_dependencies(reports: &[DocumentReport]) {
    for report in reports {
        println!("{} ({}):", report.path.display(), report.project_part);
        if report.failed {
            println!("  parse failed");
            continue;
        }
        for dependency in &report.dependencies {
            println!("  {}", dependency.display());
        }
        for name in &report.unresolved {
            println!("  unresolved: {}", name);
        }
    }
}

pub fn output_status(reports: &[DocumentReport]) {
    for report in reports {
        println!(
            "{} ({}) rev {}: {}, {} dependencies",
            report.path.display(),
            report.project_part,
            report.revision,
            state_label(report),
            report.dependencies.len()
        );
    }

    let failed = reports.iter().filter(|r| r.failed).count();
    let dirty = reports.iter().filter(|r| r.dirty).count();

    println!();
    println!(
        "Checked {} documents, {} dirty, {} failed",
        reports.len(),
        dirty,
        failed
    );
}

fn state_label(report: &DocumentReport) -> &'static str {
    if report.failed {
        "failed"
    } else if report.dirty {
        "dirty"
    } else if report.intact {
        "intact"
    } else {
        "missing"
    }
}
