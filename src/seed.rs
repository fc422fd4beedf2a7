//! Demo catalog and purchase-history fixtures.
//!
//! Loads a small multi-category catalog and a set of plausible purchase
//! histories so the retrieval pipeline has something to index out of the box.
//! Seeding is idempotent; existing rows are left untouched.

use anyhow::Result;

use crate::models::Product;
use crate::store::Store;

/// Insert the demo catalog and purchase histories. Returns
/// (products seeded, purchase histories seeded).
pub async fn run_seed(store: &Store) -> Result<(usize, usize)> {
    let products = demo_products();
    for product in &products {
        store.insert_product(product).await?;
    }

    let histories = demo_purchases();
    for (username, product_ids) in &histories {
        for product_id in *product_ids {
            store.record_purchase(username, product_id).await?;
        }
    }

    Ok((products.len(), histories.len()))
}

fn product(
    id: &str,
    name: &str,
    category: &str,
    description: &str,
    price: f64,
    tags: &[&str],
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        description: description.to_string(),
        price,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn demo_products() -> Vec<Product> {
    vec![
        // Footwear
        product(
            "P001",
            "Nike Air Max 90",
            "Footwear",
            "Classic running sneakers with visible Air cushioning and retro design.",
            129.99,
            &["sneakers", "running", "nike", "casual"],
        ),
        product(
            "P002",
            "Adidas Ultraboost 22",
            "Footwear",
            "High-performance running shoes with responsive Boost midsole.",
            189.99,
            &["sneakers", "running", "adidas", "performance"],
        ),
        product(
            "P003",
            "New Balance 574",
            "Footwear",
            "Iconic lifestyle sneakers combining comfort and heritage style.",
            89.99,
            &["sneakers", "lifestyle", "new balance", "casual"],
        ),
        product(
            "P004",
            "Puma RS-X",
            "Footwear",
            "Bold chunky sneakers with retro-futuristic design.",
            109.99,
            &["sneakers", "lifestyle", "puma", "chunky"],
        ),
        product(
            "P005",
            "Nike Metcon 8",
            "Footwear",
            "Cross-training shoes built for heavy lifts and HIIT workouts.",
            139.99,
            &["training", "crossfit", "nike", "gym"],
        ),
        // Fitness equipment
        product(
            "P006",
            "Hex Dumbbell Set 5-25 kg",
            "Fitness",
            "Rubber-coated hex dumbbells with ergonomic grip, set of 5 pairs.",
            249.99,
            &["weights", "dumbbells", "strength", "home gym"],
        ),
        product(
            "P007",
            "Adjustable Kettlebell 4-18 kg",
            "Fitness",
            "Space-saving adjustable kettlebell for full-body workouts.",
            89.99,
            &["kettlebell", "weights", "functional", "home gym"],
        ),
        product(
            "P008",
            "Olympic Barbell 20 kg",
            "Fitness",
            "Competition-grade 20 kg Olympic barbell with knurled grip.",
            199.99,
            &["barbell", "weights", "powerlifting", "strength"],
        ),
        product(
            "P009",
            "Resistance Bands Set (5 levels)",
            "Fitness",
            "Latex resistance bands from light to extra-heavy for versatile training.",
            29.99,
            &["bands", "resistance", "rehab", "portable"],
        ),
        product(
            "P010",
            "Yoga Mat Premium 6mm",
            "Fitness",
            "Non-slip TPE yoga mat with alignment guides, eco-friendly.",
            49.99,
            &["yoga", "mat", "flexibility", "pilates"],
        ),
        // Sports
        product(
            "P011",
            "Adidas UEFA Champions League Ball",
            "Sports",
            "Official match ball with seamless surface for top-level play.",
            49.99,
            &["football", "soccer", "ball", "adidas"],
        ),
        product(
            "P012",
            "Spalding NBA Official Basketball",
            "Sports",
            "Full-grain leather basketball used in NBA competition.",
            159.99,
            &["basketball", "ball", "spalding", "nba"],
        ),
        product(
            "P013",
            "Wilson US Open Tennis Ball (4-pack)",
            "Sports",
            "Tournament-grade tennis balls with extra-duty felt.",
            9.99,
            &["tennis", "ball", "wilson", "tournament"],
        ),
        product(
            "P014",
            "Mikasa V200W Volleyball",
            "Sports",
            "FIVB-approved match volleyball with micro-fiber cover.",
            69.99,
            &["volleyball", "ball", "mikasa", "competition"],
        ),
        product(
            "P015",
            "Everlast Pro Boxing Gloves 12 oz",
            "Sports",
            "Premium synthetic leather boxing gloves with wrist support.",
            59.99,
            &["boxing", "gloves", "combat", "training"],
        ),
        // Food & nutrition
        product(
            "P016",
            "Whey Protein Isolate 2 kg (Chocolate)",
            "Food",
            "Low-fat whey protein isolate with 30 g protein per serving.",
            54.99,
            &["protein", "supplement", "chocolate", "fitness"],
        ),
        product(
            "P017",
            "Organic Granola Mix 1 kg",
            "Food",
            "Crunchy granola with oats, nuts, and dried fruits, no added sugar.",
            12.99,
            &["granola", "breakfast", "organic", "healthy"],
        ),
        product(
            "P018",
            "Energy Bar Variety Pack (12 bars)",
            "Food",
            "Mixed flavors energy bars with natural ingredients for quick fuel.",
            24.99,
            &["energy", "bars", "snack", "portable"],
        ),
        product(
            "P019",
            "Cold-Pressed Olive Oil 1L",
            "Food",
            "Extra virgin olive oil from Mediterranean olives, first cold press.",
            14.99,
            &["olive oil", "cooking", "mediterranean", "healthy"],
        ),
        product(
            "P020",
            "Organic Quinoa 500g",
            "Food",
            "Tri-color organic quinoa, high in protein and gluten-free.",
            8.99,
            &["quinoa", "grain", "organic", "superfood"],
        ),
        product(
            "P021",
            "Matcha Green Tea Powder 100g",
            "Food",
            "Ceremonial-grade Japanese matcha, rich in antioxidants.",
            19.99,
            &["matcha", "tea", "japanese", "antioxidant"],
        ),
        product(
            "P022",
            "Creatine Monohydrate 500g",
            "Food",
            "Micronized creatine monohydrate for strength and power output.",
            19.99,
            &["creatine", "supplement", "performance", "strength"],
        ),
        // Technology
        product(
            "P023",
            "Apple AirPods Pro 2",
            "Technology",
            "Wireless earbuds with active noise cancellation and spatial audio.",
            249.99,
            &["earbuds", "wireless", "apple", "audio"],
        ),
        product(
            "P024",
            "Garmin Forerunner 265",
            "Technology",
            "GPS running watch with AMOLED display and training metrics.",
            449.99,
            &["smartwatch", "gps", "garmin", "running"],
        ),
        product(
            "P025",
            "Fitbit Charge 6",
            "Technology",
            "Fitness tracker with heart rate, sleep tracking, and Google integration.",
            159.99,
            &["fitness tracker", "wearable", "fitbit", "health"],
        ),
        product(
            "P026",
            "Sony WH-1000XM5 Headphones",
            "Technology",
            "Over-ear wireless headphones with industry-leading noise cancellation.",
            349.99,
            &["headphones", "wireless", "sony", "noise cancelling"],
        ),
        product(
            "P027",
            "GoPro HERO 12 Black",
            "Technology",
            "Waterproof action camera with 5.3K video and HyperSmooth stabilization.",
            399.99,
            &["camera", "action", "gopro", "video"],
        ),
        product(
            "P028",
            "Kindle Paperwhite 2024",
            "Technology",
            "E-reader with 6.8\" glare-free display and adjustable warm light.",
            139.99,
            &["ereader", "kindle", "amazon", "books"],
        ),
        product(
            "P029",
            "Logitech MX Master 3S Mouse",
            "Technology",
            "Ergonomic wireless mouse with MagSpeed scroll and multi-device support.",
            99.99,
            &["mouse", "ergonomic", "logitech", "productivity"],
        ),
        product(
            "P030",
            "Samsung Galaxy Tab S9",
            "Technology",
            "11-inch Android tablet with AMOLED display and S Pen included.",
            749.99,
            &["tablet", "samsung", "android", "productivity"],
        ),
    ]
}

fn demo_purchases() -> Vec<(&'static str, &'static [&'static str])> {
    vec![
        ("Alex", &["P001", "P005", "P006", "P016", "P022", "P024"]),
        ("Maria", &["P001", "P002", "P018", "P024", "P025"]),
        ("James", &["P001", "P003", "P017", "P019", "P028"]),
        ("Sofia", &["P005", "P006", "P007", "P008", "P016", "P022"]),
        ("Carlos", &["P001", "P011", "P012", "P016", "P018"]),
        ("Emma", &["P002", "P023", "P024", "P026", "P027"]),
        ("Liam", &["P003", "P009", "P010", "P017", "P021"]),
        ("Olivia", &["P001", "P004", "P012", "P015", "P016"]),
        (
            "Noah",
            &["P005", "P006", "P007", "P008", "P009", "P016", "P022"],
        ),
        ("Ava", &["P023", "P026", "P028", "P029", "P030", "P021"]),
        ("Ethan", &["P001", "P002", "P011", "P013", "P014", "P025"]),
        ("Mia", &["P004", "P015", "P009", "P016", "P018", "P022"]),
        ("Lucas", &["P002", "P024", "P027", "P018", "P005"]),
        (
            "Isabella",
            &["P010", "P017", "P019", "P020", "P021", "P028"],
        ),
        ("Mason", &["P001", "P002", "P003", "P004", "P023", "P026"]),
        ("Jon", &["P028", "P027", "P017"]),
        ("Albert", &["P001"]),
    ]
}
