use std::fmt::Write;

use crate::models::tracking::TrackingInfo;
use crate::session::{DisplayedReview, ReviewState, SessionState, TrackingSession};
use crate::tracking::progress::{ProgressTrack, StageState};

pub fn render_session(session: &TrackingSession) -> String {
    match session.state() {
        SessionState::Idle => "Enter your tracking code to get started.\n".to_string(),
        SessionState::Loading { previous: None } => "Loading...\n".to_string(),
        SessionState::Failed(err) => format!("Tracking Not Found\n  {}\n", err.message),
        SessionState::Loading { previous: Some(_) } | SessionState::Loaded(_) => {
            let Some(view) = session.view() else {
                return String::new();
            };
            let mut out = render_info(&view.info, session.displayed_review());
            match &view.review {
                ReviewState::Submitting => out.push_str("Submitting review...\n"),
                ReviewState::SubmissionFailed { message } => {
                    let _ = writeln!(out, "Review not saved: {message}");
                }
                ReviewState::NotReviewed | ReviewState::Submitted(_) => {}
            }
            if session.can_offer_review() {
                out.push_str("How was your delivery? Rate it with `review <CODE> --rating 1-5`.\n");
            }
            if session.is_loading() {
                out.push_str("Refreshing...\n");
            }
            out
        }
    }
}

pub fn render_info(info: &TrackingInfo, review: Option<DisplayedReview<'_>>) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{} [{}, {}]",
        info.status.label(),
        info.status.color().as_str(),
        info.status.urgency().as_str()
    );
    let _ = writeln!(out, "Tracking ID: {}", info.tracking_id);
    let _ = writeln!(out, "Pickup:   {}", info.pickup);
    let _ = writeln!(out, "Delivery: {}", info.dropoff);
    out.push('\n');

    match ProgressTrack::for_status(info.status) {
        ProgressTrack::Cancelled => {
            out.push_str("Shipment Cancelled\n  This order has been cancelled\n");
        }
        ProgressTrack::Linear { stages, .. } => {
            for stage in stages {
                let marker = match stage.state {
                    StageState::Complete => "[x]",
                    StageState::Current => "[>]",
                    StageState::Upcoming => "[ ]",
                };
                let _ = writeln!(out, "{marker} {:<15} {}", stage.label, stage.description);
            }
        }
    }

    if let Some(eta) = info.estimated_delivery {
        let _ = writeln!(out, "Estimated delivery: {}", eta.to_rfc2822());
    }

    if let Some(rider) = &info.rider {
        let _ = writeln!(
            out,
            "\nRider: {} ({} stars, {} trips)",
            rider.name,
            rider.rating_display(),
            rider.completed_trips
        );
    }

    let package = &info.package_details;
    let _ = write!(out, "\nPackage: {}", package.size.as_str());
    if package.is_fragile {
        out.push_str(", fragile");
    }
    out.push('\n');
    if !package.instructions.is_empty() {
        let _ = writeln!(out, "Instructions: {}", package.instructions);
    }

    if let Some(photo) = &info.delivery_photo {
        let _ = writeln!(out, "Delivery photo: {photo}");
    }

    if let Some(review) = review {
        let stars = "*".repeat(usize::from(review.rating));
        let _ = write!(out, "Your rating: {stars} ({}/5)", review.rating);
        if let Some(text) = review.review {
            let _ = write!(out, " \"{text}\"");
        }
        out.push('\n');
    }

    let _ = writeln!(out, "\nOrdered: {}", info.timeline.ordered.to_rfc2822());
    let _ = writeln!(out, "Last Updated: {}", info.timeline.last_update.to_rfc2822());

    out
}
