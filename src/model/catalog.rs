//! The CostaDelInka data model
//!
//! Eight collections in declaration order: transactional entities first,
//! then catalogs. Field names are the persisted contract and stay verbatim.
//! Reference fields (`*_id`) are declared by convention only; nothing checks
//! that the referenced document exists.

use super::types::{EntityKind, EntitySchema, FieldSpec, IndexSpec};
use crate::document::BsonType::{Array, Bool, Date, Double, Int, ObjectId, String};
use crate::store::Direction::{Ascending, Descending};

pub const CLIENTES: EntitySchema = EntitySchema {
    collection: "Clientes",
    entity: "Customer",
    kind: EntityKind::Transactional,
    title: "Validador de la Colección Clientes",
    fields: &[
        FieldSpec::required("nombre_completo", String)
            .describe("Debe ser un string y es requerido"),
        FieldSpec::required("email", String)
            .describe("Debe ser un string, es requerido y debe ser único"),
        FieldSpec::optional("telefono", String),
        FieldSpec::optional("tipo_documento_identidad", String),
        FieldSpec::optional("numero_documento_identidad", String)
            .describe("Debe ser único en combinación con tipo_documento_identidad"),
        FieldSpec::optional("fecha_nacimiento", Date),
        FieldSpec::optional("pais_origen_cliente", String),
        FieldSpec::optional("es_huesped_recurrente_historico", Bool),
        FieldSpec::optional("total_cancelaciones_previas_cliente", Int).minimum(0),
        FieldSpec::optional("total_reservas_previas_no_canceladas_cliente", Int).minimum(0),
        FieldSpec::optional("historial_ids_reservas", Array).items(ObjectId),
    ],
    indexes: &[
        IndexSpec::unique(&[("email", Ascending)]),
        IndexSpec::unique_sparse(&[
            ("tipo_documento_identidad", Ascending),
            ("numero_documento_identidad", Ascending),
        ]),
    ],
};

pub const RESERVAS: EntitySchema = EntitySchema {
    collection: "Reservas",
    entity: "Reservation",
    kind: EntityKind::Transactional,
    title: "Validador de la Colección Reservas",
    fields: &[
        FieldSpec::required("cliente_id", ObjectId).describe("FK a Clientes, requerido"),
        FieldSpec::required("detalle_reserva_id", ObjectId)
            .describe("FK a DetallesReserva, requerido"),
        FieldSpec::required("fecha_creacion_reserva", Date).describe("Requerido"),
        FieldSpec::required("fue_cancelada", Bool).describe("Requerido"),
        FieldSpec::optional("tiempo_anticipacion_reserva_dias", Int).minimum(0),
        FieldSpec::required("fecha_llegada", Date).describe("Requerido"),
        FieldSpec::required("fecha_salida", Date).describe("Requerido"),
        FieldSpec::required("noches_estadia", Int)
            .minimum(1)
            .describe("Requerido"),
        FieldSpec::required("estado_reserva", String).describe("Requerido"),
        FieldSpec::required("fecha_estado_reserva", Date).describe("Requerido"),
        FieldSpec::required("adr", Double).minimum(0).describe("Requerido"),
        FieldSpec::optional("canal_reserva", String),
    ],
    indexes: &[
        IndexSpec::plain(&[("cliente_id", Ascending)]),
        IndexSpec::unique(&[("detalle_reserva_id", Ascending)]),
        IndexSpec::plain(&[("fecha_llegada", Ascending)]),
        IndexSpec::plain(&[("estado_reserva", Ascending)]),
    ],
};

pub const DETALLES_RESERVA: EntitySchema = EntitySchema {
    collection: "DetallesReserva",
    entity: "ReservationDetail",
    kind: EntityKind::Transactional,
    title: "Validador de la Colección DetallesReserva",
    fields: &[
        FieldSpec::required("reserva_id", ObjectId).describe("FK a Reservas, requerido y único"),
        FieldSpec::optional("pais_origen_reserva", String),
        FieldSpec::optional("es_huesped_recurrente_al_reservar", Bool),
        FieldSpec::optional("cancelaciones_previas_cliente_al_reservar", Int).minimum(0),
        FieldSpec::optional("reservas_previas_no_canceladas_cliente_al_reservar", Int).minimum(0),
        FieldSpec::required("tipo_habitacion_reservada", String).describe("Requerido"),
        FieldSpec::optional("tipo_habitacion_asignada", String),
        FieldSpec::optional("cambios_en_reserva", Int).minimum(0),
        FieldSpec::optional("tipo_cliente_en_reserva", String),
    ],
    indexes: &[
        IndexSpec::unique(&[("reserva_id", Ascending)]),
        IndexSpec::plain(&[("tipo_habitacion_reservada", Ascending)]),
    ],
};

pub const PAGOS: EntitySchema = EntitySchema {
    collection: "Pagos",
    entity: "Payment",
    kind: EntityKind::Transactional,
    title: "Validador de la Colección Pagos",
    fields: &[
        FieldSpec::required("reserva_id", ObjectId).describe("FK a Reservas, requerido"),
        FieldSpec::optional("cliente_id", ObjectId).describe("FK a Clientes"),
        FieldSpec::required("monto_total", Double)
            .minimum(0)
            .describe("Requerido"),
        FieldSpec::required("moneda", String).describe("Requerido"),
        FieldSpec::required("fecha_pago", Date).describe("Requerido"),
        FieldSpec::required("modalidad_pago_id", ObjectId)
            .describe("FK a ModalidadesPago, requerido"),
        FieldSpec::required("estado_pago", String).describe("Requerido"),
        FieldSpec::optional("tipo_documento_pago_id", ObjectId).describe("FK a TiposDocumentoPago"),
        FieldSpec::optional("numero_documento_pago_emitido", String),
    ],
    indexes: &[
        IndexSpec::plain(&[("reserva_id", Ascending)]),
        IndexSpec::plain(&[("cliente_id", Ascending)]),
        IndexSpec::plain(&[("modalidad_pago_id", Ascending)]),
        IndexSpec::plain(&[("fecha_pago", Descending)]),
    ],
};

pub const TIPOS_HABITACION: EntitySchema = EntitySchema {
    collection: "TiposHabitacion",
    entity: "RoomType",
    kind: EntityKind::Catalog,
    title: "Validador de la Colección TiposHabitacion",
    fields: &[
        FieldSpec::required("nombre_tipo_habitacion", String).describe("Requerido y único"),
        FieldSpec::optional("codigo_interno_tipo", String).describe("Único si se provee"),
        FieldSpec::optional("descripcion", String),
        FieldSpec::required("capacidad_maxima_adultos", Int)
            .minimum(1)
            .describe("Requerido"),
        FieldSpec::optional("capacidad_maxima_ninos", Int).minimum(0),
        FieldSpec::required("precio_base_noche", Double)
            .minimum(0)
            .describe("Requerido"),
        FieldSpec::required("activo", Bool).describe("Requerido"),
        FieldSpec::optional("fotos_urls", Array).items(String),
    ],
    indexes: &[
        IndexSpec::unique(&[("nombre_tipo_habitacion", Ascending)]),
        IndexSpec::unique_sparse(&[("codigo_interno_tipo", Ascending)]),
    ],
};

pub const TIPOS_CLIENTE: EntitySchema = EntitySchema {
    collection: "TiposCliente",
    entity: "CustomerType",
    kind: EntityKind::Catalog,
    title: "Validador de la Colección TiposCliente",
    fields: &[
        FieldSpec::required("nombre_tipo_cliente", String).describe("Requerido y único"),
        FieldSpec::optional("codigo_interno_tipo_cliente", String).describe("Único si se provee"),
        FieldSpec::optional("descripcion", String),
        FieldSpec::optional("condiciones_especiales", String),
    ],
    indexes: &[
        IndexSpec::unique(&[("nombre_tipo_cliente", Ascending)]),
        IndexSpec::unique_sparse(&[("codigo_interno_tipo_cliente", Ascending)]),
    ],
};

pub const MODALIDADES_PAGO: EntitySchema = EntitySchema {
    collection: "ModalidadesPago",
    entity: "PaymentModality",
    kind: EntityKind::Catalog,
    title: "Validador de la Colección ModalidadesPago",
    fields: &[
        FieldSpec::required("nombre_modalidad", String).describe("Requerido y único"),
        FieldSpec::optional("descripcion", String),
        FieldSpec::optional("proveedor_pasarela", String),
        FieldSpec::required("activo", Bool).describe("Requerido"),
    ],
    indexes: &[IndexSpec::unique(&[("nombre_modalidad", Ascending)])],
};

pub const TIPOS_DOCUMENTO_PAGO: EntitySchema = EntitySchema {
    collection: "TiposDocumentoPago",
    entity: "PaymentDocumentType",
    kind: EntityKind::Catalog,
    title: "Validador de la Colección TiposDocumentoPago",
    fields: &[
        FieldSpec::required("nombre_documento", String).describe("Requerido y único"),
        FieldSpec::optional("requiere_datos_empresa_cliente", Bool),
        FieldSpec::required("activo", Bool).describe("Requerido"),
    ],
    indexes: &[IndexSpec::unique(&[("nombre_documento", Ascending)])],
};

/// Every entity, in initialization order.
pub const ENTITIES: &[EntitySchema] = &[
    CLIENTES,
    RESERVAS,
    DETALLES_RESERVA,
    PAGOS,
    TIPOS_HABITACION,
    TIPOS_CLIENTE,
    MODALIDADES_PAGO,
    TIPOS_DOCUMENTO_PAGO,
];

/// Every entity, in initialization order.
pub fn entities() -> &'static [EntitySchema] {
    ENTITIES
}

/// Looks up an entity by collection name.
pub fn entity(collection: &str) -> Option<&'static EntitySchema> {
    ENTITIES.iter().find(|e| e.collection == collection)
}
