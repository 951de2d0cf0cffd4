use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Traveler profile as stored by the signup/verification flows. Those flows
/// live in another service, so everything beyond the id is optional here and
/// this side never writes the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Traveler {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
}

/// Public projection of a traveler for expanded responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelerView {
    pub id: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
}

impl From<Traveler> for TravelerView {
    fn from(traveler: Traveler) -> Self {
        TravelerView {
            id: traveler.id.map(|id| id.to_hex()).unwrap_or_default(),
            full_name: traveler.full_name,
            email: traveler.email,
            phone: traveler.phone,
            city: traveler.city,
        }
    }
}

/// JWT payload issued by the auth service; `sub` is the traveler's ObjectId
/// in hex.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: usize,
}

impl Claims {
    /// Verifies an HS256 token against `JWT_SECRET` (default "secret").
    pub fn decode(token: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "secret".to_string());
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn make_token(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .unwrap()
    }

    fn claims_expiring_in(seconds: i64) -> Claims {
        Claims {
            sub: "64f1b2a9c3d4e5f601234567".to_string(),
            email: "amina@example.com".to_string(),
            exp: (chrono::Utc::now().timestamp() + seconds) as usize,
        }
    }

    #[test]
    fn round_trips_claims_through_hs256() {
        let claims = claims_expiring_in(3600);
        let token = make_token(&claims, "secret");

        let decoded = Claims::decode(&token).unwrap();

        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.email, claims.email);
    }

    #[test]
    fn rejects_expired_token() {
        let token = make_token(&claims_expiring_in(-3600), "secret");

        assert!(Claims::decode(&token).is_err());
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token = make_token(&claims_expiring_in(3600), "not-the-server-secret");

        assert!(Claims::decode(&token).is_err());
    }
}
