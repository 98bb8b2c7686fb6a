//! Email template rendering
//!
//! Pure mappings from validated payloads to self-contained HTML emails. The
//! templates live in `templates/` and are compiled by askama, which escapes
//! every interpolated value. The only unescaped insertion is the already
//! rendered traveler fragments.
//!
//! The clock is never read here: callers pass a [`RenderContext`] holding the
//! "received at" instant, so the same payload and context always produce the
//! same bytes.

use askama::Template;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::{
    Result,
    models::{
        ContactInquiry, Nationality, NewsletterSignup, PackageInquiry, Traveler, TravelerRole,
    },
};

const PLACEHOLDER: &str = "-";
const NOT_PROVIDED: &str = "Not provided";
const ADULT_ACCENT: &str = "#b8956a";
const CHILD_ACCENT: &str = "#0d6e6e";

/// Ambient values a template needs besides the payload
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub now: DateTime<Tz>,
    pub brand: String,
}

/// Subject line and HTML body ready for the mail transport
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

impl RenderContext {
    pub fn new(now: DateTime<Tz>, brand: impl Into<String>) -> Self {
        Self {
            now,
            brand: brand.into(),
        }
    }

    /// Context stamped with the current instant in `timezone`
    pub fn now_in(timezone: Tz, brand: impl Into<String>) -> Self {
        Self::new(Utc::now().with_timezone(&timezone), brand)
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// e.g. "Sunday, January 5, 2025"
    fn long_date(&self) -> String {
        self.now.format("%A, %B %-d, %Y").to_string()
    }

    /// e.g. "03:07 PM"
    fn time(&self) -> String {
        self.now.format("%I:%M %p").to_string()
    }
}

/// Completed years between `date_of_birth` and `today`, counting a birthday
/// only once its month and day have been reached. A Feb 29 birthday is
/// reached on Mar 1 in common years.
#[must_use]
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    if date_of_birth > today {
        return None;
    }
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// e.g. "05 Jan 2025"
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

/// Uppercased first letter of the name, for the avatar circle
#[must_use]
pub fn avatar_initial(name: &str) -> String {
    name.trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

#[must_use]
pub fn digits_only(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// `wa.me` deep link with a pre-filled greeting, or `None` if the phone has no digits
#[must_use]
pub fn whatsapp_link(phone: &str, greeting: &str) -> Option<String> {
    let digits = digits_only(phone);
    if digits.is_empty() {
        return None;
    }
    Some(format!(
        "https://wa.me/{digits}?text={}",
        urlencoding::encode(greeting)
    ))
}

fn mailto(address: &str, subject: &str) -> String {
    format!("mailto:{address}?subject={}", urlencoding::encode(subject))
}

#[derive(Template)]
#[template(path = "contact.html")]
struct ContactEmail<'a> {
    brand: &'a str,
    sent_date: String,
    sent_time: String,
    subject_label: &'a str,
    initial: String,
    name: &'a str,
    first_name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    whatsapp_url: Option<String>,
    message: &'a str,
    reply_href: String,
}

#[derive(Template)]
#[template(path = "newsletter.html")]
struct NewsletterEmail<'a> {
    brand: &'a str,
    sent_date: String,
    sent_time: String,
    email: &'a str,
}

#[derive(Template)]
#[template(path = "traveler.html")]
struct TravelerBlock<'a> {
    number: usize,
    role: &'static str,
    accent: &'static str,
    full_name: &'a str,
    date_of_birth: String,
    age: String,
    gender: &'static str,
    nationality: &'a str,
    passport_number: &'a str,
    passport_expiry: String,
}

#[derive(Template)]
#[template(path = "package_inquiry.html")]
struct PackageInquiryEmail<'a> {
    brand: &'a str,
    sent_date: String,
    sent_time: String,
    package_name: &'a str,
    package_price: &'a str,
    package_duration: &'a str,
    adults: u32,
    children: u32,
    total_travelers: usize,
    people_label: &'static str,
    initial: String,
    name: &'a str,
    email: &'a str,
    phone: Option<&'a str>,
    departure: &'a str,
    travelers_html: String,
    message: Option<&'a str>,
    reply_href: String,
    whatsapp_url: Option<String>,
}

pub fn contact_subject(inquiry: &ContactInquiry) -> String {
    format!("Contact Form: {}", inquiry.subject_label())
}

pub fn newsletter_subject(signup: &NewsletterSignup) -> String {
    format!("New Newsletter Subscription: {}", signup.email)
}

pub fn package_inquiry_subject(inquiry: &PackageInquiry) -> String {
    let total = inquiry.party.total();
    format!(
        "🕌 New Booking Inquiry: {} - {} {}",
        inquiry.package.name,
        total,
        if total == 1 { "Traveler" } else { "Travelers" }
    )
}

pub fn render_contact(inquiry: &ContactInquiry, ctx: &RenderContext) -> Result<RenderedEmail> {
    let subject_label = inquiry.subject_label();
    let first_name = inquiry.name.split_whitespace().next().unwrap_or(&inquiry.name);
    let greeting = format!(
        "Assalamu Alaikum {first_name}, thank you for contacting {}.",
        ctx.brand
    );

    let html = ContactEmail {
        brand: &ctx.brand,
        sent_date: ctx.long_date(),
        sent_time: ctx.time(),
        subject_label: &subject_label,
        initial: avatar_initial(&inquiry.name),
        name: &inquiry.name,
        first_name,
        email: &inquiry.email,
        phone: inquiry.phone.as_deref(),
        whatsapp_url: inquiry
            .phone
            .as_deref()
            .and_then(|p| whatsapp_link(p, &greeting)),
        message: &inquiry.message,
        reply_href: mailto(&inquiry.email, &format!("Re: {subject_label}")),
    }
    .render()?;

    Ok(RenderedEmail {
        subject: contact_subject(inquiry),
        html,
    })
}

pub fn render_newsletter(signup: &NewsletterSignup, ctx: &RenderContext) -> Result<RenderedEmail> {
    let html = NewsletterEmail {
        brand: &ctx.brand,
        sent_date: ctx.long_date(),
        sent_time: ctx.time(),
        email: &signup.email,
    }
    .render()?;

    Ok(RenderedEmail {
        subject: newsletter_subject(signup),
        html,
    })
}

/// One traveler's block. Fragments are independent so they can be joined in order.
fn render_traveler(
    number: usize,
    role: TravelerRole,
    traveler: &Traveler,
    today: NaiveDate,
) -> Result<String> {
    let block = TravelerBlock {
        number,
        role: role.label(),
        accent: match role {
            TravelerRole::Adult => ADULT_ACCENT,
            TravelerRole::Child => CHILD_ACCENT,
        },
        full_name: traveler.full_name.as_deref().unwrap_or(NOT_PROVIDED),
        date_of_birth: traveler
            .date_of_birth
            .map(format_date)
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        age: traveler
            .date_of_birth
            .and_then(|dob| age_on(dob, today))
            .map(|age| age.to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        gender: traveler.gender.map_or(PLACEHOLDER, |g| g.label()),
        nationality: traveler.nationality.as_deref().map_or(PLACEHOLDER, |code| {
            Nationality::from_code(code).map_or(code, |n| n.label())
        }),
        passport_number: traveler.passport_number.as_deref().unwrap_or(PLACEHOLDER),
        passport_expiry: traveler
            .passport_expiry
            .map(format_date)
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
    };
    Ok(block.render()?)
}

pub fn render_package_inquiry(
    inquiry: &PackageInquiry,
    ctx: &RenderContext,
) -> Result<RenderedEmail> {
    let today = ctx.today();
    let travelers_html = inquiry
        .travelers_with_roles()
        .enumerate()
        .map(|(i, (role, traveler))| render_traveler(i + 1, role, traveler, today))
        .collect::<Result<Vec<_>>>()?
        .concat();

    let contact = &inquiry.contact;
    let package = &inquiry.package;
    let total = inquiry.party.total();
    let phone = Some(contact.phone.as_str()).filter(|p| !p.trim().is_empty());
    let greeting = format!(
        "Assalamu Alaikum {}, thank you for your {} booking inquiry.",
        contact.name, package.name
    );

    let html = PackageInquiryEmail {
        brand: &ctx.brand,
        sent_date: ctx.long_date(),
        sent_time: ctx.time(),
        package_name: &package.name,
        package_price: if package.price.is_empty() {
            PLACEHOLDER
        } else {
            &package.price
        },
        package_duration: if package.duration_label.is_empty() {
            PLACEHOLDER
        } else {
            &package.duration_label
        },
        adults: inquiry.party.adults,
        children: inquiry.party.children,
        total_travelers: total,
        people_label: if total == 1 { "Person" } else { "People" },
        initial: avatar_initial(&contact.name),
        name: &contact.name,
        email: &contact.email,
        phone,
        departure: inquiry.departure.as_deref().unwrap_or("Flexible"),
        travelers_html,
        message: inquiry.message.as_deref(),
        reply_href: mailto(
            &contact.email,
            &format!("Re: {} Booking Inquiry - {}", package.name, ctx.brand),
        ),
        whatsapp_url: phone.and_then(|p| whatsapp_link(p, &greeting)),
    }
    .render()?;

    Ok(RenderedEmail {
        subject: package_inquiry_subject(inquiry),
        html,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{ContactDetails, Gender, PartySize},
        packages::PackageRef,
    };
    use chrono::TimeZone;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ctx() -> RenderContext {
        let now = chrono_tz::Asia::Jakarta
            .with_ymd_and_hms(2025, 1, 5, 15, 7, 0)
            .unwrap();
        RenderContext::new(now, "Wafud Al Haram")
    }

    fn traveler(name: &str) -> Traveler {
        Traveler {
            full_name: Some(name.to_string()),
            date_of_birth: Some(date(1990, 5, 14)),
            gender: Some(Gender::Male),
            nationality: Some("Indonesian".to_string()),
            passport_number: Some("B1234567".to_string()),
            passport_expiry: Some(date(2030, 1, 31)),
        }
    }

    fn inquiry() -> PackageInquiry {
        PackageInquiry {
            contact: ContactDetails {
                name: "Siti Rahma".to_string(),
                email: "siti@example.com".to_string(),
                phone: "+62 812-3456-7890".to_string(),
            },
            party: PartySize {
                adults: 2,
                children: 1,
            },
            travelers: vec![traveler("Siti"), traveler("Budi"), traveler("Adi")],
            package: PackageRef {
                name: "Umrah Plus".to_string(),
                price: "Rp 35.500.000".to_string(),
                duration_label: "12 Days".to_string(),
            },
            departure: None,
            message: None,
        }
    }

    fn contact() -> ContactInquiry {
        ContactInquiry {
            name: "ali khan".to_string(),
            email: "ali@x.com".to_string(),
            phone: None,
            subject: "general".to_string(),
            message: "Hi".to_string(),
        }
    }

    #[rstest]
    #[case::day_before_birthday(date(1990, 6, 15), date(2020, 6, 14), 29)]
    #[case::on_birthday(date(1990, 6, 15), date(2020, 6, 15), 30)]
    #[case::after_birthday(date(1990, 6, 15), date(2020, 6, 16), 30)]
    #[case::earlier_month(date(1990, 6, 15), date(2020, 5, 30), 29)]
    #[case::leap_day_common_year_eve(date(2000, 2, 29), date(2021, 2, 28), 20)]
    #[case::leap_day_common_year(date(2000, 2, 29), date(2021, 3, 1), 21)]
    #[case::leap_day_leap_year(date(2000, 2, 29), date(2024, 2, 29), 24)]
    #[case::born_today(date(2025, 1, 5), date(2025, 1, 5), 0)]
    fn test_age_is_day_accurate(
        #[case] dob: NaiveDate,
        #[case] today: NaiveDate,
        #[case] expected: u32,
    ) {
        assert_eq!(age_on(dob, today), Some(expected));
    }

    #[test]
    fn test_future_birth_date_has_no_age() {
        assert_eq!(age_on(date(2030, 1, 1), date(2025, 1, 1)), None);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(date(2025, 1, 5)), "05 Jan 2025");
        assert_eq!(format_date(date(2031, 12, 20)), "20 Dec 2031");
    }

    #[test]
    fn test_avatar_initial() {
        assert_eq!(avatar_initial("  siti rahma"), "S");
        assert_eq!(avatar_initial("ömer"), "Ö");
        assert_eq!(avatar_initial(""), "");
    }

    #[test]
    fn test_whatsapp_link_strips_non_digits() {
        let link = whatsapp_link("+62 (812) 3456-7890", "Salam Siti").unwrap();
        assert_eq!(link, "https://wa.me/6281234567890?text=Salam%20Siti");
        assert!(whatsapp_link("n/a", "hello").is_none());
    }

    #[test]
    fn test_context_formats_received_stamp() {
        let ctx = ctx();
        assert_eq!(ctx.long_date(), "Sunday, January 5, 2025");
        assert_eq!(ctx.time(), "03:07 PM");
        assert_eq!(ctx.today(), date(2025, 1, 5));
    }

    #[test]
    fn test_package_inquiry_renders_positional_roles() {
        let email = render_package_inquiry(&inquiry(), &ctx()).unwrap();
        assert_eq!(email.html.matches("data-traveler=").count(), 3);

        let roles: Vec<&str> = email
            .html
            .split("class=\"traveler-role\"")
            .skip(1)
            .map(|rest| {
                let start = rest.find('>').unwrap() + 1;
                let end = rest.find("</span>").unwrap();
                &rest[start..end]
            })
            .collect();
        assert_eq!(roles, vec!["Adult", "Adult", "Child"]);

        let siti = email.html.find("Siti</span>").unwrap();
        let budi = email.html.find("Budi</span>").unwrap();
        let adi = email.html.find("Adi</span>").unwrap();
        assert!(siti < budi && budi < adi);
    }

    #[test]
    fn test_package_inquiry_content() {
        let email = render_package_inquiry(&inquiry(), &ctx()).unwrap();
        assert_eq!(email.subject, "🕌 New Booking Inquiry: Umrah Plus - 3 Travelers");
        assert!(email.html.starts_with("<!DOCTYPE html>"));
        assert!(email.html.contains("14 May 1990"));
        assert!(email.html.contains("(Age: 34 years)"));
        assert!(email.html.contains("31 Jan 2030"));
        assert!(email.html.contains("Flexible"));
        assert!(email.html.contains("No additional message provided."));
        assert!(email.html.contains("https://wa.me/6281234567890?text="));
        assert!(email.html.contains("tel:+62 812-3456-7890"));
        assert!(!email.html.contains("<link"));
    }

    #[test]
    fn test_blank_traveler_renders_placeholders() {
        let mut inquiry = inquiry();
        inquiry.travelers[2] = Traveler {
            full_name: None,
            date_of_birth: None,
            gender: None,
            nationality: None,
            passport_number: None,
            passport_expiry: None,
        };
        let email = render_package_inquiry(&inquiry, &ctx()).unwrap();
        assert!(email.html.contains("Not provided</span>"));
        assert!(email.html.contains("(Age: - years)"));
    }

    #[test]
    fn test_nationality_rendered_with_label() {
        let mut inquiry = inquiry();
        inquiry.travelers[0].nationality = Some("Saudi".to_string());
        inquiry.travelers[1].nationality = Some("Martian".to_string());
        let email = render_package_inquiry(&inquiry, &ctx()).unwrap();
        assert!(email.html.contains("Saudi Arabian"));
        assert!(email.html.contains("Martian"));
        assert!(email.html.contains("Indonesian"));
    }

    #[test]
    fn test_message_section_only_when_present() {
        let mut inquiry = inquiry();
        inquiry.message = Some("Wheelchair needed at Jeddah".to_string());
        inquiry.departure = Some("2025-03".to_string());
        let email = render_package_inquiry(&inquiry, &ctx()).unwrap();
        assert!(email.html.contains("Special Requests"));
        assert!(email.html.contains("Wheelchair needed at Jeddah"));
        assert!(email.html.contains("2025-03"));
        assert!(!email.html.contains("No additional message provided."));
    }

    #[test]
    fn test_rendering_is_pure() {
        let ctx = ctx();
        let first = render_package_inquiry(&inquiry(), &ctx).unwrap();
        let second = render_package_inquiry(&inquiry(), &ctx).unwrap();
        assert_eq!(first, second);

        let first = render_contact(&contact(), &ctx).unwrap();
        let second = render_contact(&contact(), &ctx).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_user_text_is_escaped() {
        let mut inquiry = inquiry();
        inquiry.contact.name = "<script>alert(1)</script>".to_string();
        inquiry.travelers[0].full_name = Some("Tom & \"Jerry\" <b>".to_string());
        inquiry.message = Some("<script>steal()</script>".to_string());
        let email = render_package_inquiry(&inquiry, &ctx()).unwrap();
        assert!(!email.html.contains("<script>"));
        assert!(!email.html.contains("<b>"));
        assert!(email.html.contains("&lt;script&gt;"));
        assert!(email.html.contains("Tom &amp; "));

        let mut contact = contact();
        contact.message = "<script>x</script> & \"quoted\"".to_string();
        contact.name = "<img src=x>".to_string();
        let email = render_contact(&contact, &ctx()).unwrap();
        assert!(!email.html.contains("<script>"));
        assert!(!email.html.contains("<img"));
        assert!(!email.html.contains("\"quoted\""));
    }

    #[test]
    fn test_contact_without_phone() {
        let email = render_contact(&contact(), &ctx()).unwrap();
        assert_eq!(email.subject, "Contact Form: General Question");
        assert!(email.html.contains("Not provided"));
        assert!(email.html.contains("Reply to ali"));
        assert!(!email.html.contains("Call Now"));
        assert!(!email.html.contains("wa.me"));
        assert!(email.html.contains(">A</div>"));
    }

    #[test]
    fn test_contact_with_phone_has_actions() {
        let mut contact = contact();
        contact.phone = Some("+966 50 123 4567".to_string());
        contact.subject = "visa".to_string();
        let email = render_contact(&contact, &ctx()).unwrap();
        assert_eq!(email.subject, "Contact Form: visa");
        assert!(email.html.contains("Call Now"));
        assert!(email.html.contains("https://wa.me/966501234567"));
    }

    #[test]
    fn test_newsletter() {
        let signup = NewsletterSignup {
            email: "fatima@example.com".to_string(),
        };
        let email = render_newsletter(&signup, &ctx()).unwrap();
        assert_eq!(email.subject, "New Newsletter Subscription: fatima@example.com");
        assert!(email.html.contains("mailto:fatima@example.com"));
        assert!(email.html.contains("Sunday, January 5, 2025"));
    }
}
