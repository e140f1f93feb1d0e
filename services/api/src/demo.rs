use crate::infra::{
    upload_from_bytes, InMemoryApplicantRepository, InMemoryBlobStore, InMemoryIdentityProvider,
};
use admissions_portal::admissions::{
    AcademicDraft, AdminConsole, AdmissionService, ApplicationStatus, Branch, DashboardView,
    DocumentKind, EntranceExam, FilterSpec, Gender, PersonalDraft, SessionManager,
};
use admissions_portal::config::UploadConfig;
use admissions_portal::error::AppError;
use chrono::Utc;
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Skip the administrator review portion of the demo.
    #[arg(long)]
    pub(crate) skip_review: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { skip_review } = args;

    println!("Admissions portal demo");

    let repository = Arc::new(InMemoryApplicantRepository::default());
    let blobs = Arc::new(InMemoryBlobStore::default());
    let identity = Arc::new(InMemoryIdentityProvider::default());
    let sessions = SessionManager::new(identity, repository.clone());
    let admissions = AdmissionService::new(
        repository.clone(),
        blobs.clone(),
        &UploadConfig::default(),
    );

    let session = match sessions.sign_up(
        "asha.verma@example.com",
        "demo-password",
        "Asha Verma",
        Utc::now(),
    ) {
        Ok(session) => session,
        Err(err) => {
            println!("  Registration failed: {err}");
            return Ok(());
        }
    };
    println!(
        "- Registered {} ({}) with a fresh incomplete application",
        session.display_name, session.email
    );

    let mut wizard = match admissions.start(&session.uid) {
        Ok(wizard) => wizard,
        Err(err) => {
            println!("  Wizard entry refused: {err}");
            return Ok(());
        }
    };
    println!("- Wizard opened on the {} step", wizard.step().label());

    wizard.personal = demo_personal();
    match wizard.advance() {
        Ok(step) => println!("- Personal info accepted, now on {}", step.label()),
        Err(err) => {
            println!("  Personal info rejected: {err}");
            return Ok(());
        }
    }

    wizard.academic = demo_academic();
    match wizard.advance() {
        Ok(step) => println!("- Academic info accepted, now on {}", step.label()),
        Err(err) => {
            println!("  Academic info rejected: {err}");
            return Ok(());
        }
    }

    for kind in DocumentKind::ALL {
        let file_name = match kind {
            DocumentKind::Photo => "passport_photo.jpg",
            DocumentKind::HighSchoolCertificate => "high_school_certificate.pdf",
            DocumentKind::IntermediateCertificate => "intermediate_certificate.pdf",
            DocumentKind::EntranceExamResult => "jee_scorecard.pdf",
        };
        let file = upload_from_bytes(file_name, vec![0u8; 4 * 1024]);
        if let Err(err) = wizard.select_file(kind, file) {
            println!("  {} rejected: {err}", kind.label());
            return Ok(());
        }
        println!("- Staged {} ({file_name})", kind.label());
    }

    if let Err(err) = wizard.advance() {
        println!("  Could not reach the review step: {err}");
        return Ok(());
    }
    wizard.set_acknowledged(true);
    println!(
        "- Review step reached, declaration accepted, ready: {}",
        wizard.ready_to_submit()
    );

    let record = match admissions.submit(&session.uid, &mut wizard, Utc::now()) {
        Ok(record) => record,
        Err(err) => {
            println!("  Submission failed: {err}");
            return Ok(());
        }
    };
    println!(
        "- Application submitted at {} ({} documents stored)",
        record
            .submitted_at
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string()),
        blobs.object_count()
    );

    let dashboard = DashboardView::from_record(&record);
    println!(
        "- Dashboard: status {} | {}% complete",
        dashboard.status_label, dashboard.completion_percentage
    );

    if skip_review {
        return Ok(());
    }

    println!("\nAdministrator review demo");
    let console = AdminConsole::new(repository);

    let rows = match console.filtered(&FilterSpec::default()) {
        Ok(rows) => rows,
        Err(err) => {
            println!("  Listing unavailable: {err}");
            return Ok(());
        }
    };
    for row in &rows {
        println!(
            "- {} | {} | {} | {}",
            row.full_name,
            row.email,
            row.preferred_branch.label(),
            row.status.label()
        );
    }

    for target in [ApplicationStatus::UnderReview, ApplicationStatus::Approved] {
        match console.transition(&session.uid, target) {
            Ok(row) => println!("- Moved {} to {}", row.full_name, row.status.label()),
            Err(err) => {
                println!("  Transition failed: {err}");
                return Ok(());
            }
        }
    }

    Ok(())
}

fn demo_personal() -> PersonalDraft {
    PersonalDraft {
        first_name: "Asha".to_string(),
        last_name: "Verma".to_string(),
        date_of_birth: "2006-04-18".to_string(),
        gender: Some(Gender::Female),
        email: "asha.verma@example.com".to_string(),
        phone: "9876543210".to_string(),
        address: "14 Lakeview Road".to_string(),
        city: "Lucknow".to_string(),
        state: "Uttar Pradesh".to_string(),
        zip_code: "226001".to_string(),
    }
}

fn demo_academic() -> AcademicDraft {
    AcademicDraft {
        high_school_name: "City Montessori School".to_string(),
        high_school_percentage: 88.4,
        intermediate_school_name: "City Montessori Intermediate".to_string(),
        intermediate_percentage: 91.2,
        entrance_exam: Some(EntranceExam::JeeMain),
        entrance_exam_rank: 1520,
        preferred_branch: Some(Branch::ComputerScience),
    }
}
