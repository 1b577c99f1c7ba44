//! Modelo de Vehicle
//!
//! El historial cliente↔vehículo vive embebido en el vehículo como lista de
//! relaciones. A lo sumo una relación está activa; esa relación define el
//! "cliente actual" del vehículo. La lista se reemplaza completa en una sola
//! escritura para no romper el invariante entre dos pasos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Relación cliente↔vehículo embebida
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRelation {
    pub client_id: Uuid,
    pub relation_type: String,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub plate: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub is_active: bool,
    pub relations: sqlx::types::Json<Vec<ClientRelation>>,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    /// Cliente actual del vehículo: el de la única relación activa, si existe
    pub fn active_client_id(&self) -> Option<Uuid> {
        self.relations
            .iter()
            .find(|rel| rel.is_active)
            .map(|rel| rel.client_id)
    }
}

/// Calcula la nueva lista de relaciones al activar un cliente.
///
/// Desactiva todas las relaciones existentes; si ya hay una relación para
/// `client_id` la reactiva en su lugar con tipo y fecha refrescados, si no,
/// agrega una nueva entrada activa. El resultado siempre tiene exactamente
/// una relación activa.
pub fn activate_relation(
    relations: &[ClientRelation],
    client_id: Uuid,
    relation_type: &str,
    start_date: DateTime<Utc>,
) -> Vec<ClientRelation> {
    let mut updated: Vec<ClientRelation> = relations
        .iter()
        .cloned()
        .map(|mut rel| {
            rel.is_active = false;
            rel
        })
        .collect();

    match updated.iter_mut().find(|rel| rel.client_id == client_id) {
        Some(existing) => {
            existing.is_active = true;
            existing.relation_type = relation_type.to_string();
            existing.start_date = start_date;
        }
        None => updated.push(ClientRelation {
            client_id,
            relation_type: relation_type.to_string(),
            is_active: true,
            start_date,
        }),
    }

    updated
}

/// Request para registrar un vehículo
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 20))]
    pub plate: String,

    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,

    /// Cliente inicial (opcional) con su tipo de relación
    pub client_id: Option<Uuid>,
    pub relation_type: Option<String>,
}

/// Request para editar un vehículo existente
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 20))]
    pub plate: Option<String>,

    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,

    /// Si viene, activa la relación con este cliente y propaga el cliente a
    /// las órdenes huérfanas del vehículo
    pub client_id: Option<Uuid>,
    pub relation_type: Option<String>,
}

/// Vehículo enriquecido para listados: incluye el cliente actual
#[derive(Debug, Clone, Serialize)]
pub struct VehicleListItem {
    pub id: Uuid,
    pub plate: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub client_name: Option<String>,
    pub relation_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation(client_id: Uuid, active: bool) -> ClientRelation {
        ClientRelation {
            client_id,
            relation_type: "propietario".to_string(),
            is_active: active,
            start_date: Utc::now(),
        }
    }

    fn active_count(relations: &[ClientRelation]) -> usize {
        relations.iter().filter(|r| r.is_active).count()
    }

    #[test]
    fn test_activate_on_empty_list_appends_active_relation() {
        let client = Uuid::new_v4();
        let updated = activate_relation(&[], client, "propietario", Utc::now());

        assert_eq!(updated.len(), 1);
        assert_eq!(active_count(&updated), 1);
        assert_eq!(updated[0].client_id, client);
    }

    #[test]
    fn test_activate_deactivates_all_siblings() {
        let old_client = Uuid::new_v4();
        let new_client = Uuid::new_v4();
        let relations = vec![relation(old_client, true)];

        let updated = activate_relation(&relations, new_client, "arrendatario", Utc::now());

        assert_eq!(updated.len(), 2);
        assert_eq!(active_count(&updated), 1);
        assert!(updated.iter().any(|r| r.client_id == new_client && r.is_active));
        assert!(updated.iter().any(|r| r.client_id == old_client && !r.is_active));
    }

    #[test]
    fn test_reactivation_updates_in_place() {
        let client_a = Uuid::new_v4();
        let client_b = Uuid::new_v4();
        let relations = vec![relation(client_a, false), relation(client_b, true)];

        let later = Utc::now() + chrono::Duration::days(1);
        let updated = activate_relation(&relations, client_a, "empresa", later);

        // No crece la lista: se reactiva la entrada existente
        assert_eq!(updated.len(), 2);
        assert_eq!(active_count(&updated), 1);

        let reactivated = updated.iter().find(|r| r.client_id == client_a).unwrap();
        assert!(reactivated.is_active);
        assert_eq!(reactivated.relation_type, "empresa");
        assert_eq!(reactivated.start_date, later);
    }

    #[test]
    fn test_repeated_activations_keep_single_active_invariant() {
        let clients: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        let mut relations: Vec<ClientRelation> = Vec::new();

        for _ in 0..3 {
            for client in &clients {
                relations = activate_relation(&relations, *client, "propietario", Utc::now());
                assert_eq!(active_count(&relations), 1);
            }
        }

        // Reactivaciones: la lista no acumula duplicados
        assert_eq!(relations.len(), clients.len());
    }

    #[test]
    fn test_active_client_id_reads_only_active_relation() {
        let client_a = Uuid::new_v4();
        let client_b = Uuid::new_v4();
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            plate: "ABC-123".to_string(),
            make: None,
            model: None,
            year: None,
            color: None,
            is_active: true,
            relations: sqlx::types::Json(vec![relation(client_a, false), relation(client_b, true)]),
            created_at: Utc::now(),
        };

        assert_eq!(vehicle.active_client_id(), Some(client_b));
    }
}
