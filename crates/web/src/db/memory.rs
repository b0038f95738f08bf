//! In-memory store for router and service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use sudsy_core::{
    AdminUserId, Email, Kobo, OrderId, OrderStatus, PhoneNumber, PricingUnit, ServiceId, UserId,
};

use super::{
    AdminStore, CatalogStore, OrderStore, PaymentUpdate, RepositoryError, Store, UserStore,
};
use crate::models::{
    Address, AdminUser, NewAdminUser, NewUser, Order, OrderFilter, OrderItem, Service, User,
};

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<UserId, (User, String)>,
    admins: HashMap<AdminUserId, (AdminUser, String)>,
    services: HashMap<ServiceId, Service>,
    orders: HashMap<OrderId, Order>,
    items: Vec<OrderItem>,
}

/// A [`Store`] backed by hash maps.
///
/// Counts every successful write so tests can assert that a request touched
/// nothing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Activate or deactivate an admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the admin does not exist.
    pub async fn set_admin_active(
        &self,
        id: &AdminUserId,
        is_active: bool,
    ) -> Result<(), RepositoryError> {
        let mut data = self.data.write().await;
        let (admin, _) = data.admins.get_mut(id).ok_or(RepositoryError::NotFound)?;
        admin.is_active = is_active;
        self.wrote();
        Ok(())
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    /// Apply `f` to an order and return the updated copy.
    async fn modify_order(
        &self,
        id: &OrderId,
        f: impl FnOnce(&mut Order) + Send,
    ) -> Result<Order, RepositoryError> {
        let mut data = self.data.write().await;
        let order = data.orders.get_mut(id).ok_or(RepositoryError::NotFound)?;
        f(order);
        order.updated_at = Utc::now();
        self.wrote();
        Ok(order.clone())
    }

    async fn modify_user(
        &self,
        id: &UserId,
        f: impl FnOnce(&mut User) -> Result<(), RepositoryError> + Send,
    ) -> Result<User, RepositoryError> {
        let mut data = self.data.write().await;
        let (user, _) = data.users.get_mut(id).ok_or(RepositoryError::NotFound)?;
        f(user)?;
        user.updated_at = Utc::now();
        self.wrote();
        Ok(user.clone())
    }
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new: NewUser) -> Result<User, RepositoryError> {
        let mut data = self.data.write().await;
        if data.users.values().any(|(u, _)| u.email == new.email) {
            return Err(RepositoryError::Conflict("email already exists".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::generate(),
            name: new.name,
            email: new.email,
            phone: new.phone,
            addresses: Vec::new(),
            total_orders: 0,
            loyalty_points: 0,
            created_at: now,
            updated_at: now,
        };
        data.users
            .insert(user.id.clone(), (user.clone(), new.password_hash));
        self.wrote();
        Ok(user)
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.users.get(id).map(|(u, _)| u.clone()))
    }

    async fn get_user_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data
            .users
            .values()
            .find(|(u, _)| &u.email == email)
            .cloned())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        name: Option<&str>,
        phone: Option<&PhoneNumber>,
    ) -> Result<User, RepositoryError> {
        self.modify_user(id, |user| {
            if let Some(name) = name {
                user.name = name.to_string();
            }
            if let Some(phone) = phone {
                user.phone = phone.clone();
            }
            Ok(())
        })
        .await
    }

    async fn set_addresses(
        &self,
        id: &UserId,
        addresses: &[Address],
    ) -> Result<User, RepositoryError> {
        let addresses = addresses.to_vec();
        self.modify_user(id, |user| {
            user.addresses = addresses;
            Ok(())
        })
        .await
    }

    async fn record_booking(
        &self,
        id: &UserId,
        points_redeemed: i64,
    ) -> Result<(), RepositoryError> {
        self.modify_user(id, |user| {
            if user.loyalty_points < points_redeemed {
                return Err(RepositoryError::Conflict(
                    "insufficient loyalty points".to_string(),
                ));
            }
            user.loyalty_points -= points_redeemed;
            user.total_orders += 1;
            Ok(())
        })
        .await
        .map(|_| ())
    }

    async fn credit_loyalty_points(
        &self,
        id: &UserId,
        points: i64,
    ) -> Result<(), RepositoryError> {
        self.modify_user(id, |user| {
            user.loyalty_points += points;
            Ok(())
        })
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn create_admin(&self, new: NewAdminUser) -> Result<AdminUser, RepositoryError> {
        let mut data = self.data.write().await;
        if data.admins.values().any(|(a, _)| a.email == new.email) {
            return Err(RepositoryError::Conflict(
                "admin email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let admin = AdminUser {
            id: AdminUserId::generate(),
            email: new.email,
            name: new.name,
            role: new.role,
            is_active: true,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        data.admins
            .insert(admin.id.clone(), (admin.clone(), new.password_hash));
        self.wrote();
        Ok(admin)
    }

    async fn get_admin(&self, id: &AdminUserId) -> Result<Option<AdminUser>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.admins.get(id).map(|(a, _)| a.clone()))
    }

    async fn get_admin_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data
            .admins
            .values()
            .find(|(a, _)| &a.email == email)
            .cloned())
    }

    async fn record_admin_login(
        &self,
        id: &AdminUserId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut data = self.data.write().await;
        let (admin, _) = data.admins.get_mut(id).ok_or(RepositoryError::NotFound)?;
        admin.last_login_at = Some(at);
        admin.updated_at = at;
        self.wrote();
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_services(&self, active_only: bool) -> Result<Vec<Service>, RepositoryError> {
        let data = self.data.read().await;
        let mut services: Vec<Service> = data
            .services
            .values()
            .filter(|s| s.is_active || !active_only)
            .cloned()
            .collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }

    async fn get_services(&self, ids: &[ServiceId]) -> Result<Vec<Service>, RepositoryError> {
        let data = self.data.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| data.services.get(id).cloned())
            .collect())
    }

    async fn upsert_service(
        &self,
        name: &str,
        description: &str,
        pricing_unit: PricingUnit,
        unit_price: Kobo,
    ) -> Result<Service, RepositoryError> {
        let mut data = self.data.write().await;
        let now = Utc::now();

        let service = if let Some(existing) = data.services.values_mut().find(|s| s.name == name)
        {
            existing.description = description.to_string();
            existing.pricing_unit = pricing_unit;
            existing.unit_price = unit_price;
            existing.is_active = true;
            existing.updated_at = now;
            existing.clone()
        } else {
            let service = Service {
                id: ServiceId::generate(),
                name: name.to_string(),
                description: description.to_string(),
                pricing_unit,
                unit_price,
                is_active: true,
                created_at: now,
                updated_at: now,
            };
            data.services.insert(service.id.clone(), service.clone());
            service
        };

        self.wrote();
        Ok(service)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(
        &self,
        order: &Order,
        items: &[OrderItem],
    ) -> Result<(), RepositoryError> {
        let mut data = self.data.write().await;
        if data
            .orders
            .values()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(RepositoryError::Conflict(
                "order number already exists".to_string(),
            ));
        }

        data.orders.insert(order.id.clone(), order.clone());
        data.items.extend_from_slice(items);
        self.wrote();
        Ok(())
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data.orders.get(id).cloned())
    }

    async fn list_orders_for_customer(
        &self,
        customer_id: &UserId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let data = self.data.read().await;
        let mut orders: Vec<Order> = data
            .orders
            .values()
            .filter(|o| o.is_owned_by(customer_id))
            .cloned()
            .collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let data = self.data.read().await;
        let mut orders: Vec<Order> = data
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        newest_first(&mut orders);
        orders.truncate(filter.limit() as usize);
        Ok(orders)
    }

    async fn get_order_items(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let data = self.data.read().await;
        Ok(data
            .items
            .iter()
            .filter(|i| &i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn update_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        self.modify_order(id, |order| order.status = status).await
    }

    async fn update_payment(
        &self,
        id: &OrderId,
        update: PaymentUpdate,
    ) -> Result<Order, RepositoryError> {
        self.modify_order(id, |order| {
            order.payment_status = update.payment_status;
            if let Some(reference) = update.reference {
                order.payment_reference = Some(reference);
            }
        })
        .await
    }

    async fn set_payment_reference(
        &self,
        id: &OrderId,
        reference: &str,
    ) -> Result<(), RepositoryError> {
        let reference = reference.to_string();
        self.modify_order(id, |order| order.payment_reference = Some(reference))
            .await
            .map(|_| ())
    }

    async fn assign_order(
        &self,
        id: &OrderId,
        admin_id: &AdminUserId,
    ) -> Result<Order, RepositoryError> {
        let admin_id = admin_id.clone();
        self.modify_order(id, |order| order.assigned_admin_id = Some(admin_id))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ada".to_string(),
            email: Email::parse(email).unwrap(),
            phone: PhoneNumber::parse("+2348000000000").unwrap(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user(new_user("ada@example.com")).await.unwrap();
        let err = store
            .create_user(new_user("ADA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_record_booking_rejects_overdraft() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("ada@example.com")).await.unwrap();
        store.credit_loyalty_points(&user.id, 50).await.unwrap();

        let err = store.record_booking(&user.id, 51).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        store.record_booking(&user.id, 20).await.unwrap();
        let user = store.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(user.loyalty_points, 30);
        assert_eq!(user.total_orders, 1);
    }

    #[tokio::test]
    async fn test_upsert_service_by_name() {
        let store = MemoryStore::new();
        let first = store
            .upsert_service("Ironing", "", PricingUnit::PerItem, Kobo::new(50_000))
            .await
            .unwrap();
        let second = store
            .upsert_service("Ironing", "Pressed", PricingUnit::PerItem, Kobo::new(60_000))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.list_services(true).await.unwrap().len(), 1);
        assert_eq!(second.unit_price, Kobo::new(60_000));
    }

    #[tokio::test]
    async fn test_missing_order_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_order_status(&OrderId::new("missing"), OrderStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert_eq!(store.write_count(), 0);
    }
}
