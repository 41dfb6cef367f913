use serde::{Deserialize, Serialize};

/// Placeholder shown when a record has no poster.
pub const PLACEHOLDER_IMAGE: &str = "/assets/404.jpg";

/// Opaque identifier of a catalog record, unique within one catalog source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        ItemId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Coordinate { lat, lon }
    }
}

/// The three per-user lists a record can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MembershipKind {
    Favorites,
    Watched,
    ToWatch,
}

impl MembershipKind {
    pub const ALL: [MembershipKind; 3] = [
        MembershipKind::Favorites,
        MembershipKind::Watched,
        MembershipKind::ToWatch,
    ];

    /// Button label for adding or removing a record from this list.
    pub fn action_label(self, is_member: bool) -> &'static str {
        match (self, is_member) {
            (MembershipKind::Favorites, false) => "Ajouter aux favoris",
            (MembershipKind::Favorites, true) => "Retirer des favoris",
            (MembershipKind::Watched, false) => "Marquer comme vu",
            (MembershipKind::Watched, true) => "Marquer comme non vu",
            (MembershipKind::ToWatch, false) => "À voir plus tard",
            (MembershipKind::ToWatch, true) => "Retirer de la liste",
        }
    }
}

impl std::fmt::Display for MembershipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MembershipKind::Favorites => write!(f, "favorites"),
            MembershipKind::Watched => write!(f, "watched"),
            MembershipKind::ToWatch => write!(f, "to-watch"),
        }
    }
}

impl std::str::FromStr for MembershipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "favorites" | "favoris" => Ok(MembershipKind::Favorites),
            "watched" | "vu" | "vus" => Ok(MembershipKind::Watched),
            "to-watch" | "towatch" | "aVoir" => Ok(MembershipKind::ToWatch),
            other => Err(format!("unknown list: {other}")),
        }
    }
}

/// Film record as served by the catalog backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    #[serde(rename = "_id")]
    pub id: ItemId,
    pub original_title: String,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default, rename = "years")]
    pub year: Option<serde_json::Value>,
    #[serde(default, rename = "time")]
    pub duration: Option<String>,
    #[serde(default, rename = "gender")]
    pub genre: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
}

impl Film {
    /// Year as display text; the backend serves it as either a number or a string.
    pub fn year_label(&self) -> Option<String> {
        match &self.year {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Festival record as served by the catalog backend (open data field names).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Festival {
    #[serde(rename = "_id")]
    pub id: ItemId,
    #[serde(rename = "nom_du_festival")]
    pub name: String,
    #[serde(default, rename = "geocodage_xy")]
    pub location: Option<GeoPoint>,
    #[serde(default, rename = "numero_de_voie")]
    pub street_number: Option<String>,
    #[serde(default, rename = "type_de_voie_rue_avenue_boulevard_etc")]
    pub street_type: Option<String>,
    #[serde(default, rename = "nom_de_la_voie")]
    pub street_name: Option<String>,
    #[serde(default, rename = "complement_d_adresse_facultatif")]
    pub address_complement: Option<String>,
    #[serde(default, rename = "code_postal_de_la_commune_principale_de_deroulement")]
    pub postcode: Option<String>,
    #[serde(default, rename = "commune_principale_de_deroulement")]
    pub town: Option<String>,
    #[serde(default, rename = "libelle_epci_collage_en_valeur")]
    pub intercommunality: Option<String>,
    #[serde(default, rename = "departement_principal_de_deroulement")]
    pub department: Option<String>,
    #[serde(default, rename = "periode_principale_de_deroulement_du_festival")]
    pub period: Option<String>,
    #[serde(default, rename = "discipline_dominante")]
    pub discipline: Option<String>,
    #[serde(default, rename = "site_internet_du_festival")]
    pub website: Option<String>,
    #[serde(default, rename = "adresse_e_mail")]
    pub email: Option<String>,
}

impl Festival {
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.location.as_ref().map(|p| Coordinate::new(p.lat, p.lon))
    }
}

/// Variant-specific fields of a catalog record.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemDetails {
    Film(Film),
    Festival(Festival),
}

/// A film or festival record before enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: String,
    pub details: ItemDetails,
}

impl CatalogItem {
    /// Position on the map, if the record is geolocated.
    pub fn coordinate(&self) -> Option<Coordinate> {
        match &self.details {
            ItemDetails::Festival(f) => f.coordinate(),
            ItemDetails::Film(_) => None,
        }
    }
}

impl From<Film> for CatalogItem {
    fn from(film: Film) -> Self {
        CatalogItem {
            id: film.id.clone(),
            title: film.original_title.clone(),
            details: ItemDetails::Film(film),
        }
    }
}

impl From<Festival> for CatalogItem {
    fn from(festival: Festival) -> Self {
        CatalogItem {
            id: festival.id.clone(),
            title: festival.name.clone(),
            details: ItemDetails::Festival(festival),
        }
    }
}

/// Reference to an external poster image (a path relative to the image host).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(pub String);

impl ImageRef {
    /// Absolute URL of the image under `base`.
    pub fn url(&self, base: &str) -> String {
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            self.0.trim_start_matches('/')
        )
    }
}

/// Poster URL for a record, falling back to the placeholder asset.
pub fn poster_url(image: Option<&ImageRef>, base: &str) -> String {
    match image {
        Some(image) => image.url(base),
        None => PLACEHOLDER_IMAGE.to_string(),
    }
}

/// A catalog record plus the image found for it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedItem {
    pub item: CatalogItem,
    pub image: Option<ImageRef>,
}

impl EnrichedItem {
    pub fn plain(item: CatalogItem) -> Self {
        EnrichedItem { item, image: None }
    }

    pub fn with_image(item: CatalogItem, image: ImageRef) -> Self {
        EnrichedItem {
            item,
            image: Some(image),
        }
    }

    pub fn id(&self) -> &ItemId {
        &self.item.id
    }

    pub fn title(&self) -> &str {
        &self.item.title
    }

    /// The catalog record without the image.
    pub fn into_item(self) -> CatalogItem {
        self.item
    }
}
