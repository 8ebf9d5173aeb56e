//! Queries against the cascading-discount ERP schema
//!
//! `{skus}`, `{lists}` and `{warehouses}` are expanded into bound
//! parameter lists by `Statement::bind_in_list`. Price-list rows are read
//! as of `@asOf` (`YYYY-MM-DD`), inclusive of that whole day.

pub const PARENT_ACCOUNT: &str = "
SELECT TOP 1 a.AccountKey, a.ParentAccount
FROM dbo.Accounts AS a WITH (NOLOCK)
WHERE a.AccountKey = @account";

/// Item master joined with the item's most recent price-list row
pub const CATALOG: &str = "
SELECT
    i.ItemKey,
    CAST(i.Price AS float) AS ItemPrice,
    i.Coin,
    i.VatExampt,
    i.DiscountCode,
    pl.PriceListNumber,
    CAST(pl.Price AS float) AS ListPrice,
    pl.Coin AS ListCoin
FROM dbo.Items AS i WITH (NOLOCK)
OUTER APPLY (
    SELECT TOP 1 p.PriceListNumber, p.Price, p.Coin
    FROM dbo.PriceList AS p WITH (NOLOCK)
    WHERE p.ItemKey = i.ItemKey
      AND p.DatF < DATEADD(day, 1, CAST(@asOf AS date))
    ORDER BY p.DatF DESC
) AS pl
WHERE i.ItemKey IN ({skus})";

/// Discount rows of one account that touch any requested item, in the
/// order they were entered
pub const DISCOUNT_RULES: &str = "
SELECT d.DiscountCode, d.PriceListNumber, CAST(d.DiscountPrc AS float) AS DiscountPrc
FROM dbo.Discounts AS d WITH (NOLOCK)
WHERE d.AccountKey = @account
  AND d.DiscountCode IN (
      SELECT i.DiscountCode FROM dbo.Items AS i WITH (NOLOCK) WHERE i.ItemKey IN ({skus})
  )
ORDER BY d.ID";

/// Most recent price per (item, price list)
pub const LIST_PRICES: &str = "
SELECT x.ItemKey, x.PriceListNumber, x.Price
FROM (
    SELECT
        p.ItemKey,
        p.PriceListNumber,
        CAST(p.Price AS float) AS Price,
        ROW_NUMBER() OVER (
            PARTITION BY p.ItemKey, p.PriceListNumber
            ORDER BY p.DatF DESC
        ) AS rn
    FROM dbo.PriceList AS p WITH (NOLOCK)
    WHERE p.ItemKey IN ({skus})
      AND p.PriceListNumber IN ({lists})
      AND p.DatF < DATEADD(day, 1, CAST(@asOf AS date))
) AS x
WHERE x.rn = 1";

pub const SPECIAL_PRICES: &str = "
SELECT
    s.ItemKey,
    s.AccountKey,
    CAST(s.Price AS float) AS Price,
    CAST(ISNULL(s.DiscountPrc, 0) AS float) AS DiscountPrc,
    s.Coin
FROM dbo.SpecialPrices AS s WITH (NOLOCK)
WHERE s.ItemKey IN ({skus})
  AND s.AccountKey IN (@account, @parent)";

/// Latest line per (item, document type) on the account's invoices and
/// open orders
pub const LAST_PRICES: &str = "
SELECT x.ItemKey, x.DocumentID, x.Price, x.ValueDate, x.LineId
FROM (
    SELECT
        sm.ItemKey,
        st.DocumentID,
        CAST(sm.Price AS float) AS Price,
        CONVERT(varchar(23), st.ValueDate, 126) AS ValueDate,
        sm.ID AS LineId,
        ROW_NUMBER() OVER (
            PARTITION BY sm.ItemKey, st.DocumentID
            ORDER BY st.ValueDate DESC, sm.ID DESC
        ) AS rn
    FROM dbo.Stock AS st WITH (NOLOCK)
    INNER JOIN dbo.StockMoves AS sm WITH (NOLOCK)
        ON sm.StockId = st.ID
    WHERE st.AccountKey = @account
      AND st.DocumentID IN (@invoiceDoc, @orderDoc)
      AND sm.ItemKey IN ({skus})
      AND sm.Price IS NOT NULL
) AS x
WHERE x.rn = 1";

/// Warehouse balance minus quantities reserved by open sales orders
pub const STOCK: &str = "
;WITH Bal AS (
    SELECT v.ITEMKEY AS ItemKey, v.WAREHOUSE AS Warehouse, SUM(ISNULL(v.ITEMWARHBAL, 0)) AS OnHand
    FROM dbo.vBalItemWarehouse AS v WITH (NOLOCK)
    WHERE v.ITEMKEY IN ({skus})
      AND v.WAREHOUSE IN ({warehouses})
    GROUP BY v.ITEMKEY, v.WAREHOUSE
),
OpenOrders AS (
    SELECT sm.ItemKey, st.WareHouse AS Warehouse, SUM(sm.SupplyQuantity) AS OpenOrders
    FROM dbo.Stock AS st WITH (NOLOCK)
    INNER JOIN dbo.StockMoves AS sm WITH (NOLOCK)
        ON sm.StockId = st.ID
    WHERE st.DocumentID = @orderDoc
      AND st.DocNumber NOT LIKE @excludedOrders
      AND st.Status = 1
      AND st.WareHouse IN ({warehouses})
      AND sm.ItemKey IN ({skus})
      AND sm.SupplyQuantity <> 0
      AND sm.Status <> 2
    GROUP BY sm.ItemKey, st.WareHouse
)
SELECT
    COALESCE(b.ItemKey, o.ItemKey) AS ItemKey,
    COALESCE(b.Warehouse, o.Warehouse) AS Warehouse,
    CAST(ISNULL(b.OnHand, 0) AS float) AS OnHand,
    CAST(ISNULL(o.OpenOrders, 0) AS float) AS OpenOrders
FROM Bal AS b
FULL OUTER JOIN OpenOrders AS o
    ON o.ItemKey = b.ItemKey
   AND o.Warehouse = b.Warehouse";
