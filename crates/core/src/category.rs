use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Category {
    Housing,
    Utilities,
    Groceries,
    Dining,
    Transportation,
    Healthcare,
    Entertainment,
    Shopping,
    Subscriptions,
    Insurance,
    Education,
    #[serde(rename = "Personal Care")]
    PersonalCare,
    #[serde(rename = "Gifts & Donations")]
    GiftsAndDonations,
    Travel,
    Income,
    Transfer,
    /// Unclassified.
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 17] = [
        Category::Housing,
        Category::Utilities,
        Category::Groceries,
        Category::Dining,
        Category::Transportation,
        Category::Healthcare,
        Category::Entertainment,
        Category::Shopping,
        Category::Subscriptions,
        Category::Insurance,
        Category::Education,
        Category::PersonalCare,
        Category::GiftsAndDonations,
        Category::Travel,
        Category::Income,
        Category::Transfer,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Housing => "Housing",
            Category::Utilities => "Utilities",
            Category::Groceries => "Groceries",
            Category::Dining => "Dining",
            Category::Transportation => "Transportation",
            Category::Healthcare => "Healthcare",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Subscriptions => "Subscriptions",
            Category::Insurance => "Insurance",
            Category::Education => "Education",
            Category::PersonalCare => "Personal Care",
            Category::GiftsAndDonations => "Gifts & Donations",
            Category::Travel => "Travel",
            Category::Income => "Income",
            Category::Transfer => "Transfer",
            Category::Other => "Other",
        }
    }

    pub fn is_other(self) -> bool {
        self == Category::Other
    }

    /// Income and Transfer never count toward spending.
    pub fn is_spending(self) -> bool {
        !matches!(self, Category::Income | Category::Transfer)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown category: '{wanted}'"))
    }
}

/// How the bank says a statement line was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "POS")]
    Pos,
    Debit,
    Credit,
    #[serde(rename = "ACH")]
    Ach,
    #[serde(rename = "ATM")]
    Atm,
    Wire,
    #[serde(rename = "EFT")]
    Eft,
    Recurring,
    #[serde(rename = "Bill Pay")]
    BillPay,
    #[serde(rename = "Mobile Pay")]
    MobilePay,
    Online,
    Deposit,
    Withdrawal,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionType::Pos => "POS",
            TransactionType::Debit => "Debit",
            TransactionType::Credit => "Credit",
            TransactionType::Ach => "ACH",
            TransactionType::Atm => "ATM",
            TransactionType::Wire => "Wire",
            TransactionType::Eft => "EFT",
            TransactionType::Recurring => "Recurring",
            TransactionType::BillPay => "Bill Pay",
            TransactionType::MobilePay => "Mobile Pay",
            TransactionType::Online => "Online",
            TransactionType::Deposit => "Deposit",
            TransactionType::Withdrawal => "Withdrawal",
        };
        f.write_str(s)
    }
}

/// Baseline keyword table. Order matters: the first category with a keyword
/// contained in the lowercased description wins.
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (Category::Housing, &["rent", "mortgage", "hoa", "property tax", "apartment"]),
    (
        Category::Utilities,
        &[
            "electric", "gas bill", "water bill", "internet", "phone bill", "cable", "utility",
            "comcast", "verizon", "at&t", "spectrum", "xfinity", "power", "sewer",
        ],
    ),
    (
        Category::Groceries,
        &[
            "grocery", "groceries", "walmart", "costco", "trader joe", "whole foods", "kroger",
            "aldi", "safeway", "publix", "heb", "wegmans", "market", "food lion", "stop & shop",
            "giant",
        ],
    ),
    (
        Category::Dining,
        &[
            "restaurant", "mcdonald", "starbucks", "chipotle", "subway", "doordash", "uber eats",
            "grubhub", "pizza", "cafe", "coffee", "bar ", "grill", "kitchen", "taco", "burger",
            "wendy", "chick-fil", "panera", "dunkin",
        ],
    ),
    (
        Category::Transportation,
        &[
            "gas station", "shell", "chevron", "bp ", "exxon", "uber", "lyft", "parking", "toll",
            "transit", "metro", "fuel", "car wash", "auto",
        ],
    ),
    (
        Category::Healthcare,
        &[
            "doctor", "pharmacy", "medical", "hospital", "dental", "cvs", "walgreens", "health",
            "vision", "urgent care", "lab ", "prescription",
        ],
    ),
    (
        Category::Entertainment,
        &[
            "netflix", "hulu", "disney", "spotify", "apple music", "movie", "theater", "concert",
            "game", "steam", "playstation", "xbox", "youtube", "twitch", "amc",
        ],
    ),
    (
        Category::Shopping,
        &[
            "amazon", "target", "best buy", "ebay", "etsy", "nike", "clothing", "shoes", "store",
            "mall", "shop", "home depot", "lowes", "ikea", "nordstrom", "tjmaxx", "ross",
        ],
    ),
    (
        Category::Subscriptions,
        &[
            "subscription", "membership", "annual fee", "monthly fee", "gym", "fitness",
            "patreon", "adobe", "microsoft", "icloud", "dropbox",
        ],
    ),
    (
        Category::Insurance,
        &[
            "insurance", "geico", "progressive", "state farm", "allstate", "liberty mutual",
            "premium",
        ],
    ),
    (
        Category::Education,
        &[
            "tuition", "school", "university", "course", "udemy", "coursera", "textbook",
            "student loan",
        ],
    ),
    (
        Category::PersonalCare,
        &["salon", "barber", "spa", "nail", "beauty", "cosmetic", "haircut"],
    ),
    (
        Category::GiftsAndDonations,
        &["gift", "donation", "charity", "church", "tithe", "giving"],
    ),
    (
        Category::Travel,
        &[
            "airline", "hotel", "airbnb", "flight", "booking", "expedia", "kayak", "vacation",
            "resort",
        ],
    ),
    (
        Category::Income,
        &[
            "payroll", "direct deposit", "salary", "wage", "interest paid", "dividend", "refund",
            "reimbursement", "venmo received", "zelle received",
        ],
    ),
    (
        Category::Transfer,
        &["transfer", "zelle", "venmo", "paypal", "cash app", "wire"],
    ),
];

/// Curated (pattern, category, justification) rules. Patterns are matched
/// case-insensitively.
pub const PATTERN_RULES: &[(&str, Category, &str)] = &[
    (r"\bwine\b", Category::Dining, r#""wine" in name, likely a wine bar or restaurant"#),
    (r"\bpub\b", Category::Dining, r#""pub" in name, a bar/pub establishment"#),
    (r"\btavern\b", Category::Dining, r#""tavern", a dining/drinking establishment"#),
    (r"\bbrewery?\b", Category::Dining, "brewery, craft beer establishment"),
    (r"\bbistro\b", Category::Dining, r#""bistro", a casual restaurant"#),
    (r"\bcantina\b", Category::Dining, r#""cantina", a restaurant"#),
    (r"\btrattoria\b", Category::Dining, r#""trattoria", Italian restaurant"#),
    (r"\bosteria\b", Category::Dining, r#""osteria", Italian restaurant"#),
    (r"\bbrasserie\b", Category::Dining, r#""brasserie", French restaurant"#),
    (r"\btapas\b", Category::Dining, r#""tapas", Spanish restaurant/bar"#),
    (r"\bramen\b", Category::Dining, r#""ramen", noodle restaurant"#),
    (r"\bpho\b", Category::Dining, r#""pho", Vietnamese restaurant"#),
    (r"\bsushi\b", Category::Dining, r#""sushi", Japanese restaurant"#),
    (r"\bbbq\b", Category::Dining, r#""BBQ", barbecue restaurant"#),
    (r"\bwaffles?\b", Category::Dining, "breakfast/waffle establishment"),
    (r"\bpancake\b", Category::Dining, "breakfast establishment"),
    (r"\bsteakhouse\b", Category::Dining, "steakhouse restaurant"),
    (r"\bchophouse\b", Category::Dining, "chophouse restaurant"),
    (r"\bseafood\b", Category::Dining, "seafood restaurant"),
    (r"\bcrab\b", Category::Dining, "likely a crab/seafood restaurant"),
    (r"\boyster\b", Category::Dining, "oyster bar/restaurant"),
    (r"\btap\s*house\b", Category::Dining, "taphouse, bar/restaurant"),
    (r"\bale\s*house\b", Category::Dining, "ale house, bar/restaurant"),
    (r"\bsmokehouse\b", Category::Dining, "smokehouse, BBQ restaurant"),
    (r"\bpizzeria\b", Category::Dining, "pizzeria, pizza restaurant"),
    (r"\bcafe|café\b", Category::Dining, "café, restaurant/coffee shop"),
    (r"\bfood\s*(hall|court)\b", Category::Dining, "food hall/court"),
    (r"\beat(s|ery)?\b", Category::Dining, r#""eats/eatery" in name, restaurant"#),
    (r"\bburrito\b", Category::Dining, "burrito, Mexican food"),
    (r"\bbowl\b", Category::Dining, "bowl, likely a bowl restaurant"),
    (r"\bcurry\b", Category::Dining, "curry, likely restaurant"),
    (r"\bdeli\b", Category::Dining, "deli, delicatessen"),
    (r"\bgas\b", Category::Transportation, "gas, fuel purchase"),
    (r"\bfuel\b", Category::Transportation, "fuel purchase"),
    (r"\bpetro(leum)?\b", Category::Transportation, "petroleum, fuel purchase"),
    (r"\bmart\b", Category::Shopping, r#""mart", retail store"#),
    (r"\bsupply\b", Category::Shopping, "supply store"),
    (r"\boutlet\b", Category::Shopping, "outlet store"),
    (r"\bboutique\b", Category::Shopping, "boutique, retail shop"),
    (r"\bgallery\b", Category::Shopping, "gallery, retail"),
    (r"\bjewel(ry|ers?)?\b", Category::Shopping, "jewelry store"),
    (r"\belectronic", Category::Shopping, "electronics store"),
    (r"\bfurniture\b", Category::Shopping, "furniture store"),
    (r"\bappliance\b", Category::Shopping, "appliance store"),
    (r"\bliquor\b", Category::Shopping, "liquor store"),
    (r"\binn\b", Category::Travel, r#""inn", hotel/lodging"#),
    (r"\blodge\b", Category::Travel, r#""lodge", lodging"#),
    (r"\bsuites?\b", Category::Travel, r#""suites", hotel"#),
    (r"\bresort\b", Category::Travel, "resort, travel lodging"),
    (r"\bairport\b", Category::Travel, "airport, travel expense"),
    (r"\bcar\s*rental\b", Category::Travel, "car rental"),
    (r"\bevent\b", Category::Entertainment, "event, entertainment"),
    (r"\bticket\b", Category::Entertainment, "ticket purchase, entertainment"),
    (r"\bgaming\b", Category::Entertainment, "gaming, entertainment"),
    (r"\bdr\.?\s", Category::Healthcare, r#""Dr." prefix, medical"#),
    (r"\bmd\b", Category::Healthcare, r#""MD", medical"#),
    (r"\bdds\b", Category::Healthcare, r#""DDS", dental"#),
    (r"\bortho", Category::Healthcare, "ortho, medical"),
    (r"\bderm", Category::Healthcare, "derm, dermatology"),
    (r"monthly|annual|yearly|recurring", Category::Subscriptions, "recurring payment pattern"),
    (r"\bpro\s*plan\b", Category::Subscriptions, "pro plan, subscription"),
    (r"\bpremium\b", Category::Subscriptions, "premium, subscription"),
    (r"\bhair\b", Category::PersonalCare, r#""hair", personal care"#),
    (r"\bnails?\b", Category::PersonalCare, "nail, personal care"),
    (r"\bbeauty\b", Category::PersonalCare, "beauty, personal care"),
];
