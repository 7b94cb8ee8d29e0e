use marquee_common::Tier;

/// One configured origin: where its listings live and which tier its
/// records land in.
pub struct VenueSource {
    pub venue: &'static str,
    pub url: &'static str,
    pub tier: Tier,
}

/// NYC venue profile. The canonical names here match the venue
/// normalization table so ticket-URL fallback lookups work on
/// normalized theaters.
pub const NYC_VENUES: &[VenueSource] = &[
    VenueSource {
        venue: "Film at Lincoln Center",
        url: "https://www.filmlinc.org/",
        tier: Tier::Curated,
    },
    VenueSource {
        venue: "Film Forum",
        url: "https://filmforum.org/",
        tier: Tier::Curated,
    },
    VenueSource {
        venue: "Metrograph",
        url: "https://metrograph.com/",
        tier: Tier::Curated,
    },
    VenueSource {
        venue: "IFC Center",
        url: "https://www.ifccenter.com/",
        tier: Tier::Curated,
    },
    VenueSource {
        venue: "Paris Theater",
        url: "https://www.paristheatrenyc.com/",
        tier: Tier::Curated,
    },
    VenueSource {
        venue: "Angelika Film Center",
        url: "https://www.angelikafilmcenter.com/nyc",
        tier: Tier::Curated,
    },
    VenueSource {
        venue: "AMC Lincoln Square",
        url: "https://www.amctheatres.com/movie-theatres/new-york-city/amc-lincoln-square-13",
        tier: Tier::Aggregator,
    },
    VenueSource {
        venue: "AMC 84th Street",
        url: "https://www.amctheatres.com/movie-theatres/new-york-city/amc-84th-street-6",
        tier: Tier::Aggregator,
    },
    VenueSource {
        venue: "The Roxy Cinema",
        url: "https://www.roxycinemanewyork.com/",
        tier: Tier::Curated,
    },
    VenueSource {
        venue: "Alamo Drafthouse Lower Manhattan",
        url: "https://drafthouse.com/nyc",
        tier: Tier::Aggregator,
    },
    VenueSource {
        venue: "MoMA",
        url: "https://www.moma.org/calendar/film",
        tier: Tier::Curated,
    },
];

/// Venues whose screenings are always kept regardless of keyword signal.
/// These are large-format and premiere houses where anything notable
/// enough to be listed is worth surfacing.
pub const ALWAYS_INCLUDE_VENUES: &[&str] = &[
    "Angelika Film Center",
    "AMC Lincoln Square",
    "AMC 84th Street",
    "Paris Theater",
];

/// Ticket-URL fallback: the venue's homepage, so no published record
/// lacks somewhere to click through to.
pub fn venue_url(theater: &str) -> Option<&'static str> {
    NYC_VENUES
        .iter()
        .find(|v| v.venue.eq_ignore_ascii_case(theater))
        .map(|v| v.url)
}

pub fn always_include(theater: &str) -> bool {
    ALWAYS_INCLUDE_VENUES
        .iter()
        .any(|v| v.eq_ignore_ascii_case(theater))
}
