//! Static region catalog: first-level regions (states, provinces) and their
//! second-level regions (cities) for each jurisdiction.

use std::collections::BTreeMap;

use crate::models::Jurisdiction;

const US_CITIES: &[(&str, [&str; 5])] = &[
    ("Alabama", ["Birmingham", "Montgomery", "Mobile", "Huntsville", "Tuscaloosa"]),
    ("Alaska", ["Anchorage", "Fairbanks", "Juneau", "Sitka", "Ketchikan"]),
    ("Arizona", ["Phoenix", "Tucson", "Mesa", "Chandler", "Scottsdale"]),
    ("Arkansas", ["Little Rock", "Fort Smith", "Fayetteville", "Springdale", "Jonesboro"]),
    ("California", ["Los Angeles", "San Francisco", "San Diego", "San Jose", "Sacramento"]),
    ("Colorado", ["Denver", "Colorado Springs", "Aurora", "Fort Collins", "Lakewood"]),
    ("Connecticut", ["Bridgeport", "New Haven", "Stamford", "Hartford", "Waterbury"]),
    ("Delaware", ["Wilmington", "Dover", "Newark", "Middletown", "Smyrna"]),
    ("Florida", ["Jacksonville", "Miami", "Tampa", "Orlando", "St. Petersburg"]),
    ("Georgia", ["Atlanta", "Augusta", "Columbus", "Macon", "Savannah"]),
    ("Hawaii", ["Honolulu", "Hilo", "Kailua", "Kapolei", "Kaneohe"]),
    ("Idaho", ["Boise", "Meridian", "Nampa", "Idaho Falls", "Pocatello"]),
    ("Illinois", ["Chicago", "Aurora", "Naperville", "Rockford", "Joliet"]),
    ("Indiana", ["Indianapolis", "Fort Wayne", "Evansville", "South Bend", "Carmel"]),
    ("Iowa", ["Des Moines", "Cedar Rapids", "Davenport", "Sioux City", "Iowa City"]),
    ("Kansas", ["Wichita", "Overland Park", "Kansas City", "Olathe", "Topeka"]),
    ("Kentucky", ["Louisville", "Lexington", "Bowling Green", "Owensboro", "Covington"]),
    ("Louisiana", ["New Orleans", "Baton Rouge", "Shreveport", "Lafayette", "Lake Charles"]),
    ("Maine", ["Portland", "Lewiston", "Bangor", "South Portland", "Auburn"]),
    ("Maryland", ["Baltimore", "Frederick", "Rockville", "Gaithersburg", "Bowie"]),
    ("Massachusetts", ["Boston", "Worcester", "Springfield", "Cambridge", "Lowell"]),
    ("Michigan", ["Detroit", "Grand Rapids", "Warren", "Sterling Heights", "Lansing"]),
    ("Minnesota", ["Minneapolis", "St. Paul", "Rochester", "Duluth", "Bloomington"]),
    ("Mississippi", ["Jackson", "Gulfport", "Southaven", "Hattiesburg", "Biloxi"]),
    ("Missouri", ["Kansas City", "St. Louis", "Springfield", "Columbia", "Independence"]),
    ("Montana", ["Billings", "Missoula", "Great Falls", "Bozeman", "Butte"]),
    ("Nebraska", ["Omaha", "Lincoln", "Bellevue", "Grand Island", "Kearney"]),
    ("Nevada", ["Las Vegas", "Henderson", "Reno", "North Las Vegas", "Sparks"]),
    ("New Hampshire", ["Manchester", "Nashua", "Concord", "Dover", "Rochester"]),
    ("New Jersey", ["Newark", "Jersey City", "Paterson", "Elizabeth", "Trenton"]),
    ("New Mexico", ["Albuquerque", "Las Cruces", "Rio Rancho", "Santa Fe", "Roswell"]),
    ("New York", ["New York City", "Buffalo", "Rochester", "Yonkers", "Syracuse"]),
    ("North Carolina", ["Charlotte", "Raleigh", "Greensboro", "Durham", "Winston-Salem"]),
    ("North Dakota", ["Fargo", "Bismarck", "Grand Forks", "Minot", "West Fargo"]),
    ("Ohio", ["Columbus", "Cleveland", "Cincinnati", "Toledo", "Akron"]),
    ("Oklahoma", ["Oklahoma City", "Tulsa", "Norman", "Broken Arrow", "Edmond"]),
    ("Oregon", ["Portland", "Salem", "Eugene", "Gresham", "Hillsboro"]),
    ("Pennsylvania", ["Philadelphia", "Pittsburgh", "Allentown", "Erie", "Reading"]),
    ("Rhode Island", ["Providence", "Warwick", "Cranston", "Pawtucket", "East Providence"]),
    (
        "South Carolina",
        ["Charleston", "Columbia", "North Charleston", "Mount Pleasant", "Rock Hill"],
    ),
    ("South Dakota", ["Sioux Falls", "Rapid City", "Aberdeen", "Brookings", "Watertown"]),
    ("Tennessee", ["Nashville", "Memphis", "Knoxville", "Chattanooga", "Clarksville"]),
    ("Texas", ["Houston", "San Antonio", "Dallas", "Austin", "Fort Worth"]),
    ("Utah", ["Salt Lake City", "West Valley City", "Provo", "West Jordan", "Orem"]),
    ("Vermont", ["Burlington", "South Burlington", "Rutland", "Barre", "Montpelier"]),
    ("Virginia", ["Virginia Beach", "Norfolk", "Chesapeake", "Richmond", "Newport News"]),
    ("Washington", ["Seattle", "Spokane", "Tacoma", "Vancouver", "Bellevue"]),
    ("West Virginia", ["Charleston", "Huntington", "Morgantown", "Parkersburg", "Wheeling"]),
    ("Wisconsin", ["Milwaukee", "Madison", "Green Bay", "Kenosha", "Racine"]),
    ("Wyoming", ["Cheyenne", "Casper", "Laramie", "Gillette", "Rock Springs"]),
];

const CHINA_PROVINCES: &[&str] = &[
    "Beijing",
    "Shanghai",
    "Guangzhou",
    "Shenzhen",
    "Chongqing",
    "Tianjin",
    "Other",
];

const SINGAPORE: &str = "Singapore";

/// Regions of one jurisdiction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionSet {
    regions: Vec<(String, Vec<String>)>,
    /// Returned for a region that is not listed.
    fallback: Vec<String>,
}

impl RegionSet {
    pub fn new(fallback: Vec<String>) -> Self {
        Self {
            regions: Vec::new(),
            fallback,
        }
    }

    pub fn with_region<I, S>(
        mut self,
        region: impl Into<String>,
        subregions: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions
            .push((region.into(), subregions.into_iter().map(Into::into).collect()));
        self
    }

    pub fn regions(&self) -> Vec<String> {
        self.regions.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn subregions(
        &self,
        region: &str,
    ) -> Vec<String> {
        self.regions
            .iter()
            .find(|(name, _)| name == region)
            .map_or_else(|| self.fallback.clone(), |(_, cities)| cities.clone())
    }
}

/// Jurisdiction → regions → subregions. Built once, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
    sets: BTreeMap<Jurisdiction, RegionSet>,
}

impl RegionCatalog {
    /// The catalog shipped with the engine.
    ///
    /// * United States: the 50 states in alphabetical order, five cities each.
    /// * China: major provinces and municipalities; each lists itself as its
    ///   only city.
    /// * Singapore: a city-state, so region and city are both "Singapore"
    ///   whatever region is asked for.
    pub fn standard() -> Self {
        let united_states = US_CITIES
            .iter()
            .fold(RegionSet::new(Vec::new()), |set, (state, cities)| {
                set.with_region(*state, cities.iter().copied())
            });

        let china = CHINA_PROVINCES
            .iter()
            .fold(RegionSet::new(Vec::new()), |set, province| {
                set.with_region(*province, [*province])
            });

        let singapore =
            RegionSet::new(vec![SINGAPORE.to_string()]).with_region(SINGAPORE, [SINGAPORE]);

        Self::default()
            .with(Jurisdiction::Singapore, singapore)
            .with(Jurisdiction::UnitedStates, united_states)
            .with(Jurisdiction::China, china)
    }

    pub fn with(
        mut self,
        jurisdiction: Jurisdiction,
        set: RegionSet,
    ) -> Self {
        self.sets.insert(jurisdiction, set);
        self
    }

    /// Regions of one jurisdiction, empty if the catalog has none.
    pub fn region_set(
        &self,
        jurisdiction: Jurisdiction,
    ) -> RegionSet {
        self.sets.get(&jurisdiction).cloned().unwrap_or_default()
    }

    pub fn regions(
        &self,
        jurisdiction: Jurisdiction,
    ) -> Vec<String> {
        self.sets
            .get(&jurisdiction)
            .map(RegionSet::regions)
            .unwrap_or_default()
    }

    /// Cities for a region. Unknown regions yield the jurisdiction's fallback,
    /// which is empty except for Singapore.
    pub fn subregions(
        &self,
        jurisdiction: Jurisdiction,
        region: &str,
    ) -> Vec<String> {
        self.sets
            .get(&jurisdiction)
            .map(|set| set.subregions(region))
            .unwrap_or_default()
    }
}
