//! Truncated statement merchant codes and the names they stand for.

use std::sync::OnceLock;

/// `(case-folded code, display name)`. Resolution tries longer codes first;
/// equal-length codes keep table order.
pub const MERCHANTS: &[(&str, &str)] = &[
    // Amazon family
    ("amzn mktp us", "Amazon"),
    ("amzn mktp", "Amazon"),
    ("amazon mktp", "Amazon"),
    ("amzn.com", "Amazon"),
    ("amzn digital", "Amazon Digital"),
    ("amazon.com", "Amazon"),
    ("amazon prime", "Amazon Prime"),
    ("amzn prime", "Amazon Prime"),
    ("prime video", "Amazon Prime Video"),
    ("amzn web services", "Amazon Web Services (AWS)"),
    ("amazon web serv", "Amazon Web Services (AWS)"),
    ("amznprime", "Amazon Prime"),
    ("amazon tips", "Amazon Tips"),
    ("amzn mktp us*", "Amazon"),
    ("whole foods", "Whole Foods Market"),
    ("wholefds", "Whole Foods Market"),
    ("wfm", "Whole Foods Market"),

    // Apple
    ("apple.com/bill", "Apple Services"),
    ("apple.com", "Apple"),
    ("apple store", "Apple Store"),
    ("itunes", "Apple iTunes"),
    ("itunes.com", "Apple iTunes"),
    ("apple cash", "Apple Cash"),
    ("apple pay", "Apple Pay"),

    // Google
    ("google *", "Google Services"),
    ("google play", "Google Play"),
    ("google storage", "Google One Storage"),
    ("google one", "Google One"),
    ("google *youtu", "YouTube Premium"),
    ("youtube premium", "YouTube Premium"),
    ("youtube music", "YouTube Music"),
    ("google cloud", "Google Cloud"),
    ("google ads", "Google Ads"),
    ("google fi", "Google Fi"),

    // Streaming / Entertainment
    ("netflix", "Netflix"),
    ("netflix.com", "Netflix"),
    ("hulu", "Hulu"),
    ("disney plus", "Disney+"),
    ("disneyplus", "Disney+"),
    ("disney+", "Disney+"),
    ("hbo max", "HBO Max"),
    ("hbomax", "HBO Max"),
    ("max.com", "HBO Max"),
    ("spotify", "Spotify"),
    ("spotify usa", "Spotify"),
    ("paramount+", "Paramount+"),
    ("paramnt+", "Paramount+"),
    ("peacock", "Peacock"),
    ("peacocktv", "Peacock"),
    ("crunchyroll", "Crunchyroll"),
    ("crunchy", "Crunchyroll"),
    ("audible", "Audible"),
    ("kindle", "Amazon Kindle"),

    // Walmart family
    ("wal-mart", "Walmart"),
    ("walmart", "Walmart"),
    ("wm supercenter", "Walmart"),
    ("wal mart", "Walmart"),
    ("walmart.com", "Walmart"),
    ("walmrt", "Walmart"),
    ("murphy", "Murphy USA (Walmart Gas)"),
    ("sams club", "Sam's Club"),
    ("sam's club", "Sam's Club"),

    // Target
    ("target", "Target"),
    ("target.com", "Target"),
    ("tgt", "Target"),

    // Costco
    ("costco whse", "Costco"),
    ("costco", "Costco"),
    ("costco gas", "Costco Gas"),

    // Groceries
    ("kroger", "Kroger"),
    ("trader joe", "Trader Joe's"),
    ("aldi", "Aldi"),
    ("publix", "Publix"),
    ("safeway", "Safeway"),
    ("heb", "H-E-B"),
    ("h-e-b", "H-E-B"),
    ("wegmans", "Wegmans"),
    ("food lion", "Food Lion"),
    ("stop & shop", "Stop & Shop"),
    ("giant food", "Giant Food"),
    ("harris teeter", "Harris Teeter"),
    ("sprouts", "Sprouts Farmers Market"),
    ("winco", "WinCo Foods"),
    ("food4less", "Food 4 Less"),
    ("meijer", "Meijer"),
    ("piggly wiggly", "Piggly Wiggly"),
    ("winn-dixie", "Winn-Dixie"),
    ("hy-vee", "Hy-Vee"),
    ("albertsons", "Albertsons"),
    ("food city", "Food City"),
    ("fresh market", "The Fresh Market"),

    // Fast food / Dining
    ("mcdonald", "McDonald's"),
    ("mcdonalds", "McDonald's"),
    ("starbucks", "Starbucks"),
    ("sbux", "Starbucks"),
    ("chipotle", "Chipotle"),
    ("chick-fil-a", "Chick-fil-A"),
    ("chickfila", "Chick-fil-A"),
    ("chick fil a", "Chick-fil-A"),
    ("chik-fil", "Chick-fil-A"),
    ("taco bell", "Taco Bell"),
    ("tacobell", "Taco Bell"),
    ("wendys", "Wendy's"),
    ("wendy's", "Wendy's"),
    ("burger king", "Burger King"),
    ("five guys", "Five Guys"),
    ("in-n-out", "In-N-Out Burger"),
    ("panera", "Panera Bread"),
    ("panerabread", "Panera Bread"),
    ("popeyes", "Popeyes"),
    ("dunkin", "Dunkin' Donuts"),
    ("dd donut", "Dunkin' Donuts"),
    ("sonic drive", "Sonic Drive-In"),
    ("jack in the box", "Jack in the Box"),
    ("whataburger", "Whataburger"),
    ("wingstop", "Wingstop"),
    ("domino", "Domino's Pizza"),
    ("papa john", "Papa John's"),
    ("little caesars", "Little Caesars"),
    ("pizza hut", "Pizza Hut"),
    ("panda express", "Panda Express"),
    ("mod pizza", "MOD Pizza"),
    ("sweetgreen", "Sweetgreen"),
    ("noodles & co", "Noodles & Company"),
    ("ihop", "IHOP"),
    ("dennys", "Denny's"),
    ("denny's", "Denny's"),
    ("cracker barrel", "Cracker Barrel"),
    ("applebees", "Applebee's"),
    ("applebee", "Applebee's"),
    ("chilis", "Chili's"),
    ("olive garden", "Olive Garden"),
    ("red lobster", "Red Lobster"),
    ("outback", "Outback Steakhouse"),
    ("texas roadhouse", "Texas Roadhouse"),
    ("longhorn", "Longhorn Steakhouse"),

    // Ride-share / Transportation
    ("uber trip", "Uber (Ride)"),
    ("uber", "Uber"),
    ("uber eats", "Uber Eats"),
    ("uber *eats", "Uber Eats"),
    ("uber* eats", "Uber Eats"),
    ("lyft", "Lyft"),
    ("lyft *ride", "Lyft"),
    ("doordash", "DoorDash"),
    ("dd *doordash", "DoorDash"),
    ("grubhub", "Grubhub"),
    ("instacart", "Instacart"),
    ("postmates", "Postmates"),

    // Gas stations
    ("shell oil", "Shell"),
    ("shell service", "Shell"),
    ("chevron", "Chevron"),
    ("exxonmobil", "ExxonMobil"),
    ("exxon", "ExxonMobil"),
    ("mobil", "Mobil"),
    ("bp#", "BP"),
    ("bp ", "BP"),
    ("sunoco", "Sunoco"),
    ("circle k", "Circle K"),
    ("racetrac", "RaceTrac"),
    ("qt ", "QuikTrip"),
    ("quiktrip", "QuikTrip"),
    ("wawa", "Wawa"),
    ("pilot travel", "Pilot Travel Center"),
    ("loves travel", "Love's Travel Stop"),
    ("speedway", "Speedway"),
    ("valero", "Valero"),
    ("marathon petro", "Marathon"),
    ("phillips 66", "Phillips 66"),
    ("casey's", "Casey's General Store"),

    // Shopping / Retail
    ("best buy", "Best Buy"),
    ("bestbuy", "Best Buy"),
    ("home depot", "The Home Depot"),
    ("homedepot", "The Home Depot"),
    ("lowes", "Lowe's"),
    ("lowe's", "Lowe's"),
    ("ikea", "IKEA"),
    ("nordstrom", "Nordstrom"),
    ("nordstrm", "Nordstrom"),
    ("macys", "Macy's"),
    ("macy's", "Macy's"),
    ("tjx", "TJ Maxx"),
    ("tjmaxx", "TJ Maxx"),
    ("marshalls", "Marshalls"),
    ("ross stores", "Ross"),
    ("ross dress", "Ross"),
    ("old navy", "Old Navy"),
    ("gap", "Gap"),
    ("gap.com", "Gap"),
    ("nike", "Nike"),
    ("nike.com", "Nike"),
    ("adidas", "Adidas"),
    ("foot locker", "Foot Locker"),
    ("bath body", "Bath & Body Works"),
    ("bath & body", "Bath & Body Works"),
    ("ulta", "Ulta Beauty"),
    ("sephora", "Sephora"),
    ("michaels", "Michaels"),
    ("hobby lobby", "Hobby Lobby"),
    ("joann", "JOANN Fabrics"),
    ("bed bath", "Bed Bath & Beyond"),
    ("pottery barn", "Pottery Barn"),
    ("pier 1", "Pier 1 Imports"),
    ("dollar tree", "Dollar Tree"),
    ("dollar gen", "Dollar General"),
    ("five below", "Five Below"),
    ("big lots", "Big Lots"),
    ("etsy", "Etsy"),
    ("etsy.com", "Etsy"),
    ("ebay", "eBay"),
    ("ebay.com", "eBay"),
    ("wayfair", "Wayfair"),
    ("overstock", "Overstock"),

    // Pharmacy / Health
    ("cvs/pharm", "CVS Pharmacy"),
    ("cvs pharmacy", "CVS Pharmacy"),
    ("cvs", "CVS Pharmacy"),
    ("walgreens", "Walgreens"),
    ("walgreen", "Walgreens"),
    ("rite aid", "Rite Aid"),
    ("express scripts", "Express Scripts"),
    ("optumrx", "OptumRx"),
    ("labcorp", "LabCorp"),
    ("quest diag", "Quest Diagnostics"),

    // Tech / Software
    ("adobe", "Adobe"),
    ("adobe *", "Adobe"),
    ("microsoft", "Microsoft"),
    ("msft", "Microsoft"),
    ("microsoft *", "Microsoft"),
    ("zoom.us", "Zoom"),
    ("zoom video", "Zoom"),
    ("dropbox", "Dropbox"),
    ("slack", "Slack"),
    ("openai", "OpenAI"),
    ("chatgpt", "OpenAI ChatGPT"),
    ("github", "GitHub"),
    ("digitalocean", "DigitalOcean"),
    ("godaddy", "GoDaddy"),
    ("squarespace", "Squarespace"),
    ("wix", "Wix"),
    ("shopify", "Shopify"),
    ("canva", "Canva"),

    // Payment platforms
    ("paypal", "PayPal"),
    ("paypal *", "PayPal"),
    ("venmo", "Venmo"),
    ("cashapp", "Cash App"),
    ("cash app", "Cash App"),
    ("sq *", "Square"),
    ("square", "Square"),
    ("zelle", "Zelle"),
    ("stripe", "Stripe"),

    // Insurance
    ("geico", "GEICO"),
    ("progressive", "Progressive"),
    ("state farm", "State Farm"),
    ("allstate", "Allstate"),
    ("liberty mutual", "Liberty Mutual"),
    ("usaa", "USAA"),
    ("nationwide", "Nationwide"),
    ("farmers ins", "Farmers Insurance"),

    // Telecom / Internet
    ("comcast", "Comcast / Xfinity"),
    ("xfinity", "Xfinity"),
    ("verizon", "Verizon"),
    ("vzw", "Verizon Wireless"),
    ("att", "AT&T"),
    ("at&t", "AT&T"),
    ("t-mobile", "T-Mobile"),
    ("tmobile", "T-Mobile"),
    ("spectrum", "Spectrum"),
    ("cox comm", "Cox Communications"),
    ("centurylink", "CenturyLink"),
    ("frontier comm", "Frontier Communications"),
    ("sprint", "Sprint"),
    ("mint mobile", "Mint Mobile"),

    // Fitness / Gym
    ("planet fitness", "Planet Fitness"),
    ("la fitness", "LA Fitness"),
    ("equinox", "Equinox"),
    ("24 hour fit", "24 Hour Fitness"),
    ("orangetheory", "Orangetheory Fitness"),
    ("anytime fit", "Anytime Fitness"),
    ("ymca", "YMCA"),
    ("peloton", "Peloton"),

    // Travel / Hotels
    ("airbnb", "Airbnb"),
    ("vrbo", "VRBO"),
    ("marriott", "Marriott"),
    ("hilton", "Hilton"),
    ("hyatt", "Hyatt"),
    ("ihg", "IHG Hotels"),
    ("holiday inn", "Holiday Inn"),
    ("best western", "Best Western"),
    ("wyndham", "Wyndham"),
    ("expedia", "Expedia"),
    ("booking.com", "Booking.com"),
    ("southwest air", "Southwest Airlines"),
    ("southwest airl", "Southwest Airlines"),
    ("united air", "United Airlines"),
    ("delta air", "Delta Air Lines"),
    ("american air", "American Airlines"),
    ("jetblue", "JetBlue"),
    ("spirit air", "Spirit Airlines"),
    ("frontier air", "Frontier Airlines"),
    ("allegiant", "Allegiant Air"),
    ("alaska air", "Alaska Airlines"),

    // Home services
    ("comcast cable", "Comcast Cable"),
    ("duke energy", "Duke Energy"),
    ("fpl ", "Florida Power & Light"),
    ("pge ", "PG&E"),
    ("pg&e", "PG&E"),
    ("sce ", "Southern California Edison"),
    ("water utility", "Water Utility"),
];

/// Longest-first view over [`MERCHANTS`].
pub struct MerchantTable {
    entries: Vec<(&'static str, &'static str)>,
}

impl MerchantTable {
    pub fn shared() -> &'static MerchantTable {
        static TABLE: OnceLock<MerchantTable> = OnceLock::new();
        TABLE.get_or_init(|| MerchantTable::new(MERCHANTS))
    }

    pub fn new(entries: &[(&'static str, &'static str)]) -> Self {
        let mut entries = entries.to_vec();
        // stable: equal lengths keep declaration order
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { entries }
    }

    /// First code contained in the case-folded text.
    pub fn resolve(&self, text: &str) -> Option<&'static str> {
        let lower = text.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(code, _)| lower.contains(code))
            .map(|(_, name)| *name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longer_codes_win() {
        let table = MerchantTable::shared();
        assert_eq!(table.resolve("uber eats pending"), Some("Uber Eats"));
        assert_eq!(table.resolve("uber trip help.uber.com"), Some("Uber (Ride)"));
        assert_eq!(table.resolve("starbucks store 04521 seattle"), Some("Starbucks"));
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let table = MerchantTable::shared();
        assert_eq!(table.resolve("SQ COFFEE HOUSE AMZN MKTP US"), Some("Amazon"));
        assert_eq!(table.resolve("Shell Oil 1234"), Some("Shell"));
    }

    #[test]
    fn unknown_text_resolves_to_none() {
        let table = MerchantTable::shared();
        assert_eq!(table.resolve("joe's pub"), None);
        assert_eq!(table.resolve("   "), None);
    }

    #[test]
    fn ties_keep_declaration_order() {
        let table = MerchantTable::new(&[("abc", "First"), ("xyz", "Second")]);
        assert_eq!(table.resolve("xyz abc"), Some("First"));
    }
}
